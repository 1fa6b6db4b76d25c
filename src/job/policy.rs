//! `Auto | Explicit(value)` fields.
//!
//! On disk an auto policy is the string `"auto"` and an explicit one is the
//! bare value, which keeps job files compatible with hand-edited ones.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const AUTO: &str = "auto";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Policy<T> {
    Auto,
    Explicit(T),
}

impl<T> Default for Policy<T> {
    fn default() -> Self {
        Policy::Auto
    }
}

impl<T: Copy> Policy<T> {
    pub fn explicit(&self) -> Option<T> {
        match self {
            Policy::Auto => None,
            Policy::Explicit(value) => Some(*value),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Policy::Auto)
    }
}

impl<T: Serialize> Serialize for Policy<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Policy::Auto => serializer.serialize_str(AUTO),
            Policy::Explicit(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Policy<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Value(T),
            Text(String),
            Null,
        }

        match Repr::<T>::deserialize(deserializer)? {
            Repr::Value(value) => Ok(Policy::Explicit(value)),
            Repr::Text(text) if text.trim().eq_ignore_ascii_case(AUTO) => Ok(Policy::Auto),
            Repr::Text(text) => Err(D::Error::custom(format!(
                "expected \"auto\" or a number, got {:?}",
                text
            ))),
            Repr::Null => Ok(Policy::Auto),
        }
    }
}

//! Cache key computation
//!
//! key = BLAKE3("hems-build" || len || canonical_job_json || len || generator_version)
//!
//! The canonical JSON sorts object keys at every level, so the key does not
//! depend on struct field order or on how serde_json orders maps.

use crate::error::CacheError;
use crate::job::Job;
use crate::types::Hash;
use blake3::Hasher;
use serde_json::Value;
use std::fmt;

/// Digest identifying one build cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(pub Hash);

impl CacheKey {
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-char hex digest.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let hash: Hash = bytes.try_into().ok()?;
        Some(CacheKey(hash))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Compact JSON with object keys sorted recursively.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Key for a (pinned) job under a generator version.
pub fn key_for(job: &Job, generator_version: &str) -> Result<CacheKey, CacheError> {
    let value = serde_json::to_value(job).map_err(|e| CacheError::Serialize(e.to_string()))?;
    let canonical = canonical_json(&value);

    let mut hasher = Hasher::new();
    hasher.update(b"hems-build");
    hasher.update(&(canonical.len() as u64).to_be_bytes());
    hasher.update(canonical.as_bytes());
    hasher.update(&(generator_version.len() as u64).to_be_bytes());
    hasher.update(generator_version.as_bytes());

    Ok(CacheKey(*hasher.finalize().as_bytes()))
}

//! Shared value types.

use serde::{Deserialize, Serialize};

/// BLAKE3 digest
pub type Hash = [u8; 32];

/// WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self { lat: 0.0, lon: 0.0 }
    }
}

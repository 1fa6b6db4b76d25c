//! Height and helipad position resolution
//!
//! Pure functions of a job. Results are pinned back into the job before the
//! cache key is computed, so auto policies become concrete values.

use crate::job::{Job, Policy};
use crate::types::Location;
use serde::{Deserialize, Serialize};

pub const METERS_PER_FLOOR: f64 = 3.8;
pub const AREA_PER_FLOOR_M2: f64 = 1200.0;
pub const DEFAULT_FLOORS: u32 = 4;
pub const MIN_DERIVED_FLOORS: u32 = 2;
pub const MAX_DERIVED_FLOORS: u32 = 8;

/// Concrete values derived from a job's policies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAttributes {
    pub floors: u32,
    pub height_m: f64,
    pub helipad: Location,
}

/// Floors from measured footprint area, half-to-even rounded and clamped.
pub fn floors_from_area(area_m2: Option<f64>) -> u32 {
    match area_m2 {
        Some(area) if area.is_finite() && area > 0.0 => {
            let floors = (area / AREA_PER_FLOOR_M2).round_ties_even();
            floors.clamp(MIN_DERIVED_FLOORS as f64, MAX_DERIVED_FLOORS as f64) as u32
        }
        _ => DEFAULT_FLOORS,
    }
}

pub fn resolve_floors(job: &Job) -> u32 {
    match job.hospital.floors {
        Policy::Explicit(floors) => floors,
        Policy::Auto => floors_from_area(job.hospital.area_m2),
    }
}

/// Explicit height wins regardless of floors.
pub fn resolve_height(job: &Job, floors: u32) -> f64 {
    match job.hospital.height_m {
        Policy::Explicit(height) => height,
        Policy::Auto => floors as f64 * METERS_PER_FLOOR,
    }
}

pub fn resolve_helipad_position(job: &Job) -> Location {
    job.helipad.position.unwrap_or(job.location)
}

pub fn resolve(job: &Job) -> ResolvedAttributes {
    let floors = resolve_floors(job);
    ResolvedAttributes {
        floors,
        height_m: resolve_height(job, floors),
        helipad: resolve_helipad_position(job),
    }
}

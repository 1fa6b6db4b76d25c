//! Job model and its sub-specifications.

use crate::job::policy::Policy;
use crate::resolve::ResolvedAttributes;
use crate::site::Site;
use crate::types::Location;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Area of interest around the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AoiSpec {
    pub radius_m: u32,
}

impl Default for AoiSpec {
    fn default() -> Self {
        Self { radius_m: 600 }
    }
}

/// Main structure parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalSpec {
    pub footprint_source: String,
    pub footprint_override: Option<serde_json::Value>,
    pub height_m: Policy<f64>,
    pub roof_type: String,
    pub floors: Policy<u32>,
    pub area_m2: Option<f64>,
}

impl Default for HospitalSpec {
    fn default() -> Self {
        Self {
            footprint_source: "auto".to_string(),
            footprint_override: None,
            height_m: Policy::Auto,
            roof_type: "flat".to_string(),
            floors: Policy::Auto,
            area_m2: None,
        }
    }
}

/// Helipad placement and appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelipadSpec {
    pub mode: String,
    /// Explicit pad position; `None` means co-located with the main structure.
    pub position: Option<Location>,
    #[serde(rename = "type")]
    pub pad_type: String,
    pub surface: String,
    pub lighting: bool,
}

impl Default for HelipadSpec {
    fn default() -> Self {
        Self {
            mode: "auto".to_string(),
            position: None,
            pad_type: "hospital".to_string(),
            surface: "concrete".to_string(),
            lighting: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundSpec {
    pub generate_parking: bool,
    pub generate_roads: bool,
    pub generate_sidewalks: bool,
    pub generate_curbs: bool,
}

impl Default for GroundSpec {
    fn default() -> Self {
        Self {
            generate_parking: true,
            generate_roads: false,
            generate_sidewalks: true,
            generate_curbs: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropsSpec {
    pub cars_density: f64,
    pub people: bool,
    pub fences: bool,
    pub trees: bool,
}

impl Default for PropsSpec {
    fn default() -> Self {
        Self {
            cars_density: 0.7,
            people: false,
            fences: true,
            trees: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSpec {
    pub night_strength: f64,
    pub interior_glow: bool,
}

impl Default for LightingSpec {
    fn default() -> Self {
        Self {
            night_strength: 0.6,
            interior_glow: true,
        }
    }
}

/// Output quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    High,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Quality::Low),
            "medium" => Ok(Quality::Medium),
            "high" => Ok(Quality::High),
            other => Err(format!(
                "Invalid quality: {} (must be 'low', 'medium', or 'high')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSpec {
    pub quality: Quality,
    pub flatten_helipad: bool,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            quality: Quality::High,
            flatten_helipad: true,
        }
    }
}

/// Persisted generation parameters for one site.
///
/// `id`, `name` and `location` are required on disk; every sub-specification
/// falls back to its defaults when missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    /// Slug of the site's display name
    pub name: String,
    pub location: Location,
    #[serde(default)]
    pub aoi: AoiSpec,
    #[serde(default)]
    pub hospital: HospitalSpec,
    #[serde(default)]
    pub helipad: HelipadSpec,
    #[serde(default)]
    pub ground: GroundSpec,
    #[serde(default)]
    pub props: PropsSpec,
    #[serde(default)]
    pub lighting: LightingSpec,
    #[serde(default)]
    pub output: OutputSpec,
}

impl Job {
    /// Fresh job with all-default sub-specifications.
    pub fn new(site: &Site, location: Location, aoi_radius_m: u32) -> Self {
        Self {
            id: site.identifier.clone(),
            name: site.slug.clone(),
            location,
            aoi: AoiSpec {
                radius_m: aoi_radius_m,
            },
            hospital: HospitalSpec::default(),
            helipad: HelipadSpec::default(),
            ground: GroundSpec::default(),
            props: PropsSpec::default(),
            lighting: LightingSpec::default(),
            output: OutputSpec::default(),
        }
    }

    /// The (identifier, slug) identity this job is stored under.
    pub fn site(&self) -> Site {
        Site {
            identifier: self.id.clone(),
            slug: self.name.clone(),
        }
    }

    /// Copy of this job with auto height and floor policies replaced by the
    /// resolved concrete values.
    pub fn pinned(&self, resolved: &ResolvedAttributes) -> Self {
        let mut hospital = self.hospital.clone();
        hospital.floors = Policy::Explicit(resolved.floors);
        hospital.height_m = Policy::Explicit(resolved.height_m);
        Self {
            hospital,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_site() -> Site {
        Site::new("12PA", "Mercy Hospital")
    }

    #[test]
    fn test_new_job_uses_defaults() {
        let job = Job::new(&sample_site(), Location::new(40.0, -80.0), 750);
        assert_eq!(job.id, "12PA");
        assert_eq!(job.name, "Mercy_Hospital");
        assert_eq!(job.aoi.radius_m, 750);
        assert_eq!(job.hospital.roof_type, "flat");
        assert!(job.hospital.floors.is_auto());
        assert_eq!(job.helipad.position, None);
        assert_eq!(job.output.quality, Quality::High);
    }

    #[test]
    fn test_json_top_level_keys() {
        let job = Job::new(&sample_site(), Location::new(40.0, -80.0), 600);
        let value = serde_json::to_value(&job).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "aoi", "ground", "helipad", "hospital", "id", "lighting", "location", "name",
                "output", "props"
            ]
        );
        assert_eq!(value["helipad"]["type"], "hospital");
        assert_eq!(value["hospital"]["height_m"], "auto");
        assert!(value["helipad"]["position"].is_null());
    }

    #[test]
    fn test_missing_sections_default() {
        let json = r#"{"id": "12PA", "name": "Mercy", "location": {"lat": 1.0, "lon": 2.0},
                       "hospital": {"roof_type": "gable"}}"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.hospital.roof_type, "gable");
        assert_eq!(job.hospital.footprint_source, "auto");
        assert_eq!(job.ground, GroundSpec::default());
        assert_eq!(job.aoi.radius_m, 600);
    }

    #[test]
    fn test_missing_identity_is_rejected() {
        let json = r#"{"name": "Mercy", "location": {"lat": 1.0, "lon": 2.0}}"#;
        assert!(serde_json::from_str::<Job>(json).is_err());

        let json = r#"{"id": "12PA", "name": "Mercy"}"#;
        assert!(serde_json::from_str::<Job>(json).is_err());
    }

    #[test]
    fn test_quality_parse() {
        assert_eq!("Medium".parse::<Quality>().unwrap(), Quality::Medium);
        assert!("ultra".parse::<Quality>().is_err());
        assert_eq!(Quality::Low.to_string(), "low");
    }

    #[test]
    fn test_pinned_replaces_auto_policies() {
        let job = Job::new(&sample_site(), Location::new(40.0, -80.0), 600);
        let resolved = ResolvedAttributes {
            floors: 4,
            height_m: 15.2,
            helipad: job.location,
        };
        let pinned = job.pinned(&resolved);
        assert_eq!(pinned.hospital.floors, Policy::Explicit(4));
        assert_eq!(pinned.hospital.height_m, Policy::Explicit(15.2));
        assert!(job.hospital.floors.is_auto(), "source job is untouched");
    }
}

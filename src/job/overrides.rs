//! Typed partial updates for job sub-specifications.
//!
//! Every `merged` call returns a new value; the receiver is never mutated, so
//! one default value can safely seed many sites.

use crate::job::model::{
    GroundSpec, HelipadSpec, HospitalSpec, Job, LightingSpec, OutputSpec, PropsSpec, Quality,
};
use crate::job::policy::Policy;
use crate::types::Location;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footprint_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footprint_override: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_m: Option<Policy<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roof_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floors: Option<Policy<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_m2: Option<f64>,
}

impl HospitalSpec {
    pub fn merged(&self, o: &HospitalOverrides) -> Self {
        Self {
            footprint_source: o
                .footprint_source
                .clone()
                .unwrap_or_else(|| self.footprint_source.clone()),
            footprint_override: o
                .footprint_override
                .clone()
                .or_else(|| self.footprint_override.clone()),
            height_m: o.height_m.unwrap_or(self.height_m),
            roof_type: o.roof_type.clone().unwrap_or_else(|| self.roof_type.clone()),
            floors: o.floors.unwrap_or(self.floors),
            area_m2: o.area_m2.or(self.area_m2),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelipadOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Location>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub pad_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lighting: Option<bool>,
}

impl HelipadSpec {
    pub fn merged(&self, o: &HelipadOverrides) -> Self {
        Self {
            mode: o.mode.clone().unwrap_or_else(|| self.mode.clone()),
            position: o.position.or(self.position),
            pad_type: o.pad_type.clone().unwrap_or_else(|| self.pad_type.clone()),
            surface: o.surface.clone().unwrap_or_else(|| self.surface.clone()),
            lighting: o.lighting.unwrap_or(self.lighting),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_parking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_roads: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_sidewalks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_curbs: Option<bool>,
}

impl GroundSpec {
    pub fn merged(&self, o: &GroundOverrides) -> Self {
        Self {
            generate_parking: o.generate_parking.unwrap_or(self.generate_parking),
            generate_roads: o.generate_roads.unwrap_or(self.generate_roads),
            generate_sidewalks: o.generate_sidewalks.unwrap_or(self.generate_sidewalks),
            generate_curbs: o.generate_curbs.unwrap_or(self.generate_curbs),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cars_density: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fences: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trees: Option<bool>,
}

impl PropsSpec {
    pub fn merged(&self, o: &PropsOverrides) -> Self {
        Self {
            cars_density: o.cars_density.unwrap_or(self.cars_density),
            people: o.people.unwrap_or(self.people),
            fences: o.fences.unwrap_or(self.fences),
            trees: o.trees.unwrap_or(self.trees),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub night_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interior_glow: Option<bool>,
}

impl LightingSpec {
    pub fn merged(&self, o: &LightingOverrides) -> Self {
        Self {
            night_strength: o.night_strength.unwrap_or(self.night_strength),
            interior_glow: o.interior_glow.unwrap_or(self.interior_glow),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flatten_helipad: Option<bool>,
}

impl OutputSpec {
    pub fn merged(&self, o: &OutputOverrides) -> Self {
        Self {
            quality: o.quality.unwrap_or(self.quality),
            flatten_helipad: o.flatten_helipad.unwrap_or(self.flatten_helipad),
        }
    }
}

/// Overrides for a whole job, one optional block per sub-specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital: Option<HospitalOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helipad: Option<HelipadOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground: Option<GroundOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<PropsOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lighting: Option<LightingOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputOverrides>,
}

impl JobOverrides {
    pub fn is_empty(&self) -> bool {
        *self == JobOverrides::default()
    }
}

impl Job {
    /// Copy of this job with `overrides` applied; identity and location are
    /// never touched.
    pub fn with_overrides(&self, overrides: &JobOverrides) -> Job {
        Job {
            id: self.id.clone(),
            name: self.name.clone(),
            location: self.location,
            aoi: self.aoi.clone(),
            hospital: match &overrides.hospital {
                Some(o) => self.hospital.merged(o),
                None => self.hospital.clone(),
            },
            helipad: match &overrides.helipad {
                Some(o) => self.helipad.merged(o),
                None => self.helipad.clone(),
            },
            ground: match &overrides.ground {
                Some(o) => self.ground.merged(o),
                None => self.ground.clone(),
            },
            props: match &overrides.props {
                Some(o) => self.props.merged(o),
                None => self.props.clone(),
            },
            lighting: match &overrides.lighting {
                Some(o) => self.lighting.merged(o),
                None => self.lighting.clone(),
            },
            output: match &overrides.output {
                Some(o) => self.output.merged(o),
                None => self.output.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::Site;

    fn job() -> Job {
        Job::new(&Site::new("12PA", "Mercy"), Location::new(40.0, -80.0), 600)
    }

    #[test]
    fn test_empty_overrides_are_identity() {
        let base = job();
        assert!(JobOverrides::default().is_empty());
        assert_eq!(base.with_overrides(&JobOverrides::default()), base);
    }

    #[test]
    fn test_partial_hospital_override() {
        let base = job();
        let overrides = JobOverrides {
            hospital: Some(HospitalOverrides {
                roof_type: Some("gable".to_string()),
                floors: Some(Policy::Explicit(6)),
                ..Default::default()
            }),
            ..Default::default()
        };

        let updated = base.with_overrides(&overrides);
        assert_eq!(updated.hospital.roof_type, "gable");
        assert_eq!(updated.hospital.floors, Policy::Explicit(6));
        assert_eq!(updated.hospital.height_m, Policy::Auto);
        assert_eq!(base.hospital.roof_type, "flat", "base job is not mutated");
    }

    #[test]
    fn test_overrides_from_json() {
        let overrides: JobOverrides = serde_json::from_str(
            r#"{
                "helipad": {"position": {"lat": 40.001, "lon": -80.002}, "type": "rooftop"},
                "props": {"cars_density": 0.2},
                "output": {"quality": "low"}
            }"#,
        )
        .unwrap();

        let updated = job().with_overrides(&overrides);
        assert_eq!(updated.helipad.position, Some(Location::new(40.001, -80.002)));
        assert_eq!(updated.helipad.pad_type, "rooftop");
        assert_eq!(updated.props.cars_density, 0.2);
        assert!(updated.props.trees);
        assert_eq!(updated.output.quality, Quality::Low);
        assert_eq!(updated.lighting, LightingSpec::default());
    }

    #[test]
    fn test_auto_override_resets_pinned_height() {
        let mut base = job();
        base.hospital.height_m = Policy::Explicit(30.0);
        let overrides: JobOverrides =
            serde_json::from_str(r#"{"hospital": {"height_m": "auto"}}"#).unwrap();
        assert_eq!(
            base.with_overrides(&overrides).hospital.height_m,
            Policy::Auto
        );
    }
}

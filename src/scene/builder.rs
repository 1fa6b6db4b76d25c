//! Scene builder
//!
//! Ground, prop and lighting parameters are accepted but do not change the
//! scene yet; they travel into cache metadata instead.

use crate::job::Job;
use crate::resolve::ResolvedAttributes;
use crate::scene::model::{DrapedPolygon, ElevationMode, Scene, SceneLight, SceneObject};

pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;
/// Edge length of the helipad markings drape
pub const DRAPE_EDGE_M: f64 = 12.0;

pub const HOSPITAL_OBJ: &str = "hospital_0.obj";
pub const HELIPAD_MARKER_OBJ: &str = "helipad_marker.obj";
pub const HELIPAD_MARKINGS_POL: &str = "helipad_markings.pol";
pub const HELIPAD_LIGHT: &str = "heli_pad_green";

/// Turns a resolved job into a scene. Implementations must be deterministic.
pub trait SceneBuilder: Send + Sync {
    fn build(&self, job: &Job, resolved: &ResolvedAttributes) -> Scene;
}

/// Default builder: main structure, helipad marker, markings drape, pad light.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelipadSceneBuilder;

impl SceneBuilder for HelipadSceneBuilder {
    fn build(&self, job: &Job, resolved: &ResolvedAttributes) -> Scene {
        let site = job.location;
        let pad = resolved.helipad;

        Scene {
            objects: vec![
                SceneObject {
                    obj: HOSPITAL_OBJ.to_string(),
                    lat: site.lat,
                    lon: site.lon,
                    heading: 0.0,
                    elevation: ElevationMode::Ground,
                },
                SceneObject {
                    obj: HELIPAD_MARKER_OBJ.to_string(),
                    lat: pad.lat,
                    lon: pad.lon,
                    heading: 0.0,
                    elevation: ElevationMode::Ground,
                },
            ],
            draped_polygons: vec![DrapedPolygon {
                name: HELIPAD_MARKINGS_POL.to_string(),
                vertices: square_around(site.lat, site.lon, DRAPE_EDGE_M),
            }],
            lines: Vec::new(),
            lights: vec![SceneLight {
                name: HELIPAD_LIGHT.to_string(),
                lat: pad.lat,
                lon: pad.lon,
                intensity: 1.0,
            }],
        }
    }
}

/// Square of `size_m` edge centred on (lat, lon), equirectangular approximation.
///
/// Vertices run SW, SE, NE, NW as `[lat, lon]`.
pub fn square_around(lat: f64, lon: f64, size_m: f64) -> Vec<[f64; 2]> {
    let half = size_m / 2.0;
    let lat_offset = half / METERS_PER_DEGREE_LAT;

    let mut lon_divisor = METERS_PER_DEGREE_LAT * lat.to_radians().cos();
    if lon_divisor == 0.0 {
        lon_divisor = 1.0;
    }
    let lon_offset = half / lon_divisor;

    vec![
        [lat - lat_offset, lon - lon_offset],
        [lat - lat_offset, lon + lon_offset],
        [lat + lat_offset, lon + lon_offset],
        [lat + lat_offset, lon - lon_offset],
    ]
}

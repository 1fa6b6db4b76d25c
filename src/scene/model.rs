//! Scene primitives
//!
//! A scene is built once and then only read. Its JSON form is the `scene.json`
//! artifact; field order is fixed by the struct definitions, so serialization
//! is byte-stable for identical input.

use serde::Serialize;

/// How an object's elevation is interpreted. Every placed object currently
/// sits on the terrain surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElevationMode {
    Ground,
}

/// A placed static object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "object")]
pub struct SceneObject {
    pub obj: String,
    pub lat: f64,
    pub lon: f64,
    pub heading: f64,
    pub elevation: ElevationMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "draped_polygon")]
pub struct DrapedPolygon {
    pub name: String,
    /// Closed ring of `[lat, lon]` vertices
    pub vertices: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "line")]
pub struct SceneLine {
    pub name: String,
    pub vertices: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "light")]
pub struct SceneLight {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub draped_polygons: Vec<DrapedPolygon>,
    pub lines: Vec<SceneLine>,
    pub lights: Vec<SceneLight>,
}

impl Scene {
    /// Pretty JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

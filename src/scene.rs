//! Scene graph and the builder that produces it from a resolved job.

mod builder;
mod model;

pub use builder::{
    square_around, HelipadSceneBuilder, SceneBuilder, DRAPE_EDGE_M, HELIPAD_LIGHT,
    HELIPAD_MARKER_OBJ, HELIPAD_MARKINGS_POL, HOSPITAL_OBJ, METERS_PER_DEGREE_LAT,
};
pub use model::{DrapedPolygon, ElevationMode, Scene, SceneLight, SceneLine, SceneObject};

//! Text writers for the static artifacts of a scenery package.

mod obj;
mod overlay;
mod polygon;

pub use obj::{quad_mesh, write_obj8, write_simple_hospital_obj, write_simple_marker_obj, ObjMesh};
pub use overlay::{
    render_overlay_stub, tile_for_location, write_overlay_stub, write_overlay_text, OverlayTile,
    OVERLAY_DIR,
};
pub use polygon::write_helipad_markings_pol;

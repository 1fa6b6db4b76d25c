//! Draped polygon definition for the helipad markings.

use crate::error::DownstreamError;
use std::fs;
use std::path::Path;

const HELIPAD_MARKINGS_POL: &str = "A\n850\nDRAPED_POLYGON\n\nTEXTURE helipad_markings.png\nSCALE 1.0 1.0\n";

pub fn write_helipad_markings_pol(path: &Path) -> Result<(), DownstreamError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DownstreamError::io(parent, e))?;
    }
    fs::write(path, HELIPAD_MARKINGS_POL).map_err(|e| DownstreamError::io(path, e))
}

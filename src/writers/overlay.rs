//! Overlay tile writer
//!
//! Emits a human-readable stand-in for a binary overlay tile, one file per
//! one-degree tile.

use crate::atomic::write_atomic;
use crate::error::DownstreamError;
use crate::scene::Scene;
use crate::types::Location;
use std::path::{Path, PathBuf};

pub const OVERLAY_DIR: &str = "Earth nav data";

/// One-degree tile addressed by the floor of its south-west corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayTile {
    pub lat: i32,
    pub lon: i32,
}

impl OverlayTile {
    /// `+40-080` style tile name
    pub fn folder_name(&self) -> String {
        let lat_prefix = if self.lat >= 0 { '+' } else { '-' };
        let lon_prefix = if self.lon >= 0 { '+' } else { '-' };
        format!(
            "{}{:02}{}{:03}",
            lat_prefix,
            self.lat.unsigned_abs(),
            lon_prefix,
            self.lon.unsigned_abs()
        )
    }

    /// `{root}/Earth nav data/{tile}/{tile}.dsf`
    pub fn file_path(&self, root: &Path) -> PathBuf {
        let folder = self.folder_name();
        root.join(OVERLAY_DIR)
            .join(&folder)
            .join(format!("{}.dsf", folder))
    }
}

pub fn tile_for_location(location: Location) -> OverlayTile {
    OverlayTile {
        lat: location.lat.floor() as i32,
        lon: location.lon.floor() as i32,
    }
}

fn format_vertices(vertices: &[[f64; 2]]) -> String {
    vertices
        .iter()
        .map(|[lat, lon]| format!("  {:.6} {:.6}", lat, lon))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_overlay_stub(scene: &Scene) -> String {
    let mut lines: Vec<String> = vec![
        "# Overlay DSF placeholder (textual stub).".to_string(),
        "# Objects".to_string(),
    ];
    for obj in &scene.objects {
        lines.push(format!(
            "OBJECT {} {:.6} {:.6} {:.1}",
            obj.obj, obj.lat, obj.lon, obj.heading
        ));
    }
    lines.push("# Draped polygons".to_string());
    for poly in &scene.draped_polygons {
        lines.push(format!("POLYGON {}", poly.name));
        lines.push(format_vertices(&poly.vertices));
    }
    lines.push("# Lines".to_string());
    for line in &scene.lines {
        lines.push(format!("LINE {}", line.name));
        lines.push(format_vertices(&line.vertices));
    }
    lines.push("# Lights".to_string());
    for light in &scene.lights {
        lines.push(format!(
            "LIGHT {} {:.6} {:.6} {:.2}",
            light.name, light.lat, light.lon, light.intensity
        ));
    }
    lines.join("\n")
}

/// Write `content` at the tile path for `location` under `root`.
pub fn write_overlay_text(
    root: &Path,
    location: Location,
    content: &str,
) -> Result<PathBuf, DownstreamError> {
    let path = tile_for_location(location).file_path(root);
    write_atomic(&path, content.as_bytes()).map_err(|e| DownstreamError::io(&path, e))?;
    Ok(path)
}

/// Render `scene` and write it at the tile for `location`; returns the path.
pub fn write_overlay_stub(
    root: &Path,
    scene: &Scene,
    location: Location,
) -> Result<PathBuf, DownstreamError> {
    write_overlay_text(root, location, &render_overlay_stub(scene))
}

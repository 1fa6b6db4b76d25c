//! OBJ8 writer for static scenery objects.

use crate::error::DownstreamError;
use std::fs;
use std::path::Path;

pub const HOSPITAL_QUAD_M: f64 = 30.0;
pub const MARKER_QUAD_M: f64 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ObjMesh {
    pub vertices: Vec<[f64; 3]>,
    pub uvs: Vec<[f64; 2]>,
    pub indices: Vec<u32>,
}

/// Flat quad of `size` metres centred on the origin.
pub fn quad_mesh(size: f64) -> ObjMesh {
    let half = size / 2.0;
    ObjMesh {
        vertices: vec![
            [-half, 0.0, -half],
            [half, 0.0, -half],
            [half, 0.0, half],
            [-half, 0.0, half],
        ],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

pub fn render_obj8(mesh: &ObjMesh, texture: &str, lit_texture: &str) -> String {
    let mut lines: Vec<String> = vec![
        "I".to_string(),
        "800".to_string(),
        "OBJ".to_string(),
        String::new(),
        format!("TEXTURE {}", texture),
        format!("TEXTURE_LIT {}", lit_texture),
        String::new(),
        "POINT_COUNTS 0 0 0 0".to_string(),
        String::new(),
    ];
    for ([x, y, z], [u, v]) in mesh.vertices.iter().zip(mesh.uvs.iter()) {
        lines.push(format!("VT {:.3} {:.3} {:.3} {:.4} {:.4}", x, y, z, u, v));
    }
    lines.push(String::new());
    for idx in &mesh.indices {
        lines.push(format!("IDX {}", idx));
    }
    lines.push(String::new());
    lines.join("\n")
}

pub fn write_obj8(
    path: &Path,
    mesh: &ObjMesh,
    texture: &str,
    lit_texture: &str,
) -> Result<(), DownstreamError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DownstreamError::io(parent, e))?;
    }
    fs::write(path, render_obj8(mesh, texture, lit_texture))
        .map_err(|e| DownstreamError::io(path, e))
}

pub fn write_simple_hospital_obj(path: &Path) -> Result<(), DownstreamError> {
    write_obj8(
        path,
        &quad_mesh(HOSPITAL_QUAD_M),
        "hospital_0.png",
        "hospital_0_LIT.png",
    )
}

pub fn write_simple_marker_obj(path: &Path) -> Result<(), DownstreamError> {
    write_obj8(
        path,
        &quad_mesh(MARKER_QUAD_M),
        "helipad_markings.png",
        "helipad_markings_LIT.png",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_obj8_header_and_body() {
        let text = render_obj8(&quad_mesh(10.0), "a.png", "a_LIT.png");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(&lines[..3], &["I", "800", "OBJ"]);
        assert!(lines.contains(&"TEXTURE a.png"));
        assert!(lines.contains(&"TEXTURE_LIT a_LIT.png"));
        assert!(lines.contains(&"VT -5.000 0.000 -5.000 0.0000 0.0000"));
        assert_eq!(lines.iter().filter(|l| l.starts_with("IDX ")).count(), 6);
    }

    #[test]
    fn test_write_marker_obj_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("objects").join("helipad_marker.obj");
        write_simple_marker_obj(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("TEXTURE helipad_markings.png"));
        assert!(text.contains("VT 3.000 0.000 3.000 1.0000 1.0000"));
    }
}

//! Wavefront OBJ parsing via the `tobj` crate.
//!
//! Material libraries are not resolved: the original viewer never fetched
//! `.mtl` files for remote models, so geometry gets a neutral color and
//! normals come from the file when present, otherwise from the faces.

use crate::loader::LoadError;
use crate::mesh::{accumulate_vertex_normals, TriangleMesh, NEUTRAL_BASE_COLOR};
use glam::Vec3;
use std::io::Cursor;

pub fn parse(bytes: &[u8]) -> Result<TriangleMesh, LoadError> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _materials) =
        tobj::load_obj_buf(&mut Cursor::new(bytes), &options, |_mtl_path| {
            // Skip material libraries entirely.
            Ok((Vec::new(), Default::default()))
        })
        .map_err(|err| LoadError::Obj { source: err })?;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        let base = positions.len() as u32;
        positions.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2])),
        );
        if mesh.normals.len() == mesh.positions.len() {
            normals.extend(
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| Vec3::new(n[0], n[1], n[2]).normalize_or_zero()),
            );
        } else {
            // Lengths only diverge when the file carries no normals at all;
            // pad now and recompute below.
            normals.resize(positions.len(), Vec3::ZERO);
        }
        indices.extend(mesh.indices.iter().map(|&i| base + i));
    }

    if normals.iter().any(|n| n.length_squared() < f32::EPSILON) {
        normals = accumulate_vertex_normals(&positions, &indices);
    }

    let mut mesh = TriangleMesh::new(positions, normals, indices);
    mesh.base_color = NEUTRAL_BASE_COLOR;
    Ok(mesh)
}

// ========================================================================
// Tests
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_FACE: &str = "o quad\n\
        v 0 0 0\n\
        v 1 0 0\n\
        v 1 1 0\n\
        v 0 1 0\n\
        f 1 2 3 4\n";

    #[test]
    fn parses_and_triangulates_quads() {
        let mesh = parse(CUBE_FACE.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.base_color, NEUTRAL_BASE_COLOR);
    }

    #[test]
    fn computes_normals_when_missing() {
        let mesh = parse(CUBE_FACE.as_bytes()).unwrap();
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        for n in &mesh.normals {
            assert!((n.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn keeps_normals_from_file() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\n\
            vn 0 0 1\nvn 0 0 1\nvn 0 0 1\n\
            f 1//1 2//2 3//3\n";
        let mesh = parse(src.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.normals.iter().all(|n| (n.z - 1.0).abs() < 1e-5));
    }

    #[test]
    fn mtl_reference_is_ignored() {
        let src = format!("mtllib missing.mtl\nusemtl whatever\n{CUBE_FACE}");
        let mesh = parse(src.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }
}

//! STL parsing (binary and ASCII, auto-detected by `stl_io`).
//!
//! STL files are Z-up and carry no material data: the loader bakes the
//! Z-up to Y-up conversion into the vertex positions and attaches the
//! viewer's default color.

use crate::loader::LoadError;
use crate::mesh::{accumulate_vertex_normals, TriangleMesh, DEFAULT_BASE_COLOR};
use glam::{Mat4, Vec3};
use std::io::Cursor;

pub fn parse(bytes: &[u8]) -> Result<TriangleMesh, LoadError> {
    let mut cursor = Cursor::new(bytes);
    let indexed = stl_io::read_stl(&mut cursor).map_err(|err| LoadError::Stl { source: err })?;

    let positions: Vec<Vec3> = indexed
        .vertices
        .iter()
        .map(|v| {
            let [x, y, z]: [f32; 3] = (*v).into();
            Vec3::new(x, y, z)
        })
        .collect();

    let indices: Vec<u32> = indexed
        .faces
        .iter()
        .flat_map(|face| face.vertices.iter().map(|&i| i as u32))
        .collect();

    // Accumulate stored per-face normals onto shared vertices. Sloppy
    // exporters write zero normals, so fall back to geometry for those.
    let computed = accumulate_vertex_normals(&positions, &indices);
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for face in &indexed.faces {
        let [nx, ny, nz]: [f32; 3] = face.normal.into();
        let stored = Vec3::new(nx, ny, nz);
        for &vi in &face.vertices {
            normals[vi] += stored;
        }
    }
    for (normal, fallback) in normals.iter_mut().zip(&computed) {
        let len = normal.length();
        if len > f32::EPSILON {
            *normal /= len;
        } else {
            *normal = *fallback;
        }
    }

    let mut mesh = TriangleMesh::new(positions, normals, indices);
    mesh.base_color = DEFAULT_BASE_COLOR;
    mesh.apply_transform(Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2));
    Ok(mesh)
}

// ========================================================================
// Tests
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_TRIANGLE: &str = "solid test\n\
        facet normal 0 0 1\n\
        outer loop\n\
        vertex 0 0 0\n\
        vertex 1 0 0\n\
        vertex 0 1 0\n\
        endloop\n\
        endfacet\n\
        endsolid test\n";

    #[test]
    fn parses_ascii_stl() {
        let mesh = parse(ASCII_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.base_color, DEFAULT_BASE_COLOR);
    }

    #[test]
    fn converts_z_up_to_y_up() {
        // Source vertex (0, 1, 0) is "forward" in Z-up space; after
        // conversion it must point toward -Z with Y untouched.
        let mesh = parse(ASCII_TRIANGLE.as_bytes()).unwrap();
        let v = mesh
            .positions
            .iter()
            .find(|p| p.z.abs() > 0.5)
            .expect("converted vertex present");
        assert!((v.z + 1.0).abs() < 1e-6);
        assert!(v.y.abs() < 1e-6);
    }

    #[test]
    fn parses_binary_stl() {
        // 80-byte header, u32 triangle count, one 50-byte record.
        let mut bytes = vec![0u8; 80];
        bytes.extend_from_slice(&1u32.to_le_bytes());
        let floats: [f32; 12] = [
            0.0, 0.0, 1.0, // normal
            0.0, 0.0, 0.0, // v0
            1.0, 0.0, 0.0, // v1
            0.0, 1.0, 0.0, // v2
        ];
        for f in floats {
            bytes.extend_from_slice(&f.to_le_bytes());
        }
        bytes.extend_from_slice(&0u16.to_le_bytes());

        let mesh = parse(&bytes).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.normals.iter().all(|n| (n.length() - 1.0).abs() < 1e-5));
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let err = parse(&[1, 2, 3, 4]).unwrap_err();
        assert!(matches!(err, LoadError::Stl { .. }));
    }
}

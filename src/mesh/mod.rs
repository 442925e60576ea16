//! In-memory triangle mesh and bounding-box types.
//!
//! Every loader produces a [`TriangleMesh`]: an indexed triangle list with
//! per-vertex normals and a flat base color. Formats that carry no material
//! data (STL, 3MF without color resources) get a default color assigned by
//! their loader.

use glam::{Mat4, Vec3};

/// Default base color for formats without native material data.
/// Matches the viewer's stock blue (#2F70FE).
pub const DEFAULT_BASE_COLOR: [f32; 3] = [0.184, 0.439, 0.996];

/// Neutral color for formats whose materials are ignored at load time.
pub const NEUTRAL_BASE_COLOR: [f32; 3] = [0.8, 0.8, 0.8];

/// Indexed triangle mesh in the viewer's Y-up coordinate space.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 3],
}

impl TriangleMesh {
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals,
            indices,
            base_color: DEFAULT_BASE_COLOR,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() || self.positions.is_empty()
    }

    /// Local-space axis-aligned bounding box over all vertex positions.
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Bake a transform into the vertex positions and normals.
    /// Used for 3MF build-item transforms and Z-up to Y-up conversion.
    pub fn apply_transform(&mut self, matrix: Mat4) {
        for position in &mut self.positions {
            *position = matrix.transform_point3(*position);
        }
        let normal_matrix = matrix.inverse().transpose();
        for normal in &mut self.normals {
            let n = normal_matrix.transform_vector3(*normal);
            *normal = n.normalize_or_zero();
        }
    }

    /// Append another mesh's geometry (3MF models may have several objects).
    pub fn merge(&mut self, other: &TriangleMesh) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }
}

/// Accumulate face normals onto shared vertices and normalize.
///
/// Vertices shared by faces with similar normals end up smooth; hard edges
/// get a reasonable average. Degenerate accumulations fall back to +Y.
pub fn accumulate_vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let face_normal =
            (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        normals[i0] += face_normal;
        normals[i1] += face_normal;
        normals[i2] += face_normal;
    }
    for normal in &mut normals {
        let len = normal.length();
        if len > f32::EPSILON {
            *normal /= len;
        } else {
            *normal = Vec3::Y;
        }
    }
    normals
}

// ========================================================================
// Aabb
// ========================================================================

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::EMPTY;
        for point in points {
            aabb.min = aabb.min.min(point);
            aabb.max = aabb.max.max(point);
        }
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// The eight corners, used for screen-space projection scoring.
    pub fn corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(max.x, max.y, max.z),
        ]
    }

    /// Transform the box by a matrix and rewrap axis-aligned.
    pub fn transform(&self, matrix: Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        Aabb::from_points(self.corners().map(|c| matrix.transform_point3(c)))
    }
}

// ========================================================================
// Dimensions
// ========================================================================

/// Raw (pre-scale) model extents, reported outward once per load.
///
/// `units` is a nominal label only; no unit conversion is performed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub units: String,
}

impl Dimensions {
    pub fn from_size(size: Vec3) -> Self {
        Self {
            width: size.x,
            height: size.y,
            depth: size.z,
            units: "unitless".to_string(),
        }
    }
}

// ========================================================================
// Tests
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleMesh {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        let normals = accumulate_vertex_normals(&positions, &indices);
        TriangleMesh::new(positions, normals, indices)
    }

    #[test]
    fn aabb_wraps_all_vertices() {
        let mesh = quad();
        let aabb = mesh.aabb();
        assert_eq!(aabb.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(aabb.size(), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(aabb.center(), Vec3::new(0.5, 1.0, 0.0));
    }

    #[test]
    fn empty_aabb_reports_zero_size() {
        let aabb = Aabb::from_points(std::iter::empty());
        assert!(aabb.is_empty());
        assert_eq!(aabb.size(), Vec3::ZERO);
        assert_eq!(aabb.center(), Vec3::ZERO);
    }

    #[test]
    fn accumulated_normals_are_unit_length() {
        let mesh = quad();
        for normal in &mesh.normals {
            assert!((normal.length() - 1.0).abs() < 1e-5);
            // Planar quad in the XY plane faces +Z.
            assert!((normal.z - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn degenerate_face_normal_falls_back_to_up() {
        let positions = vec![Vec3::ZERO, Vec3::ZERO, Vec3::ZERO];
        let normals = accumulate_vertex_normals(&positions, &[0, 1, 2]);
        assert!(normals.iter().all(|n| *n == Vec3::Y));
    }

    #[test]
    fn transform_bakes_into_positions() {
        let mut mesh = quad();
        mesh.apply_transform(Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        let aabb = mesh.aabb();
        assert_eq!(aabb.min.x, 5.0);
        assert_eq!(aabb.max.x, 6.0);
    }

    #[test]
    fn merge_offsets_indices() {
        let mut a = quad();
        let b = quad();
        a.merge(&b);
        assert_eq!(a.triangle_count(), 4);
        assert_eq!(a.positions.len(), 8);
        assert_eq!(a.indices[6], 4);
    }

    #[test]
    fn aabb_transform_rewraps_rotated_corners() {
        let aabb = Aabb::from_points([Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0)]);
        let rotated = aabb.transform(Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2));
        // After a 90-degree yaw, X and Z extents swap.
        assert!((rotated.size().x - 6.0).abs() < 1e-5);
        assert!((rotated.size().z - 2.0).abs() < 1e-5);
        assert!((rotated.size().y - 4.0).abs() < 1e-5);
    }
}

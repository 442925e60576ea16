//! Perspective camera and framing arithmetic.
//!
//! The fit-distance formula here is shared by the one-shot scene framer and
//! the thumbnail synthesizer; the synthesizer feeds it the requested
//! thumbnail aspect instead of the live surface aspect, which is why a
//! thumbnail can frame differently from the on-screen view.

use crate::mesh::Aabb;
use glam::{Mat4, Vec2, Vec3};

/// Safety margin multiplier so the fitted mesh clears the viewport edges.
pub const FIT_MARGIN: f32 = 1.25;

/// Default vertical field of view in degrees.
pub const DEFAULT_FOV_Y_DEG: f32 = 50.0;

/// Look-at target vertical bias: the target sits at this fraction of the
/// scaled bounding-box height, not at the true center.
pub const TARGET_HEIGHT_BIAS: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(2.0, 2.0, 2.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_deg: DEFAULT_FOV_Y_DEG,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_y_deg.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Project a world-space point into normalized device coordinates.
    pub fn project_ndc(&self, point: Vec3) -> Vec3 {
        self.view_projection().project_point3(point)
    }

    /// Set clip planes proportional to a framing distance, preserving
    /// depth-buffer precision across wildly varying model scales.
    pub fn set_planes_for_distance(&mut self, distance: f32) {
        self.near = (distance / 100.0).max(0.01);
        self.far = distance * 100.0;
    }
}

/// Camera distance required to fit a scaled bounding-box width and height
/// under the vertical FOV and its aspect-derived horizontal FOV, whichever
/// is larger, with the fixed safety margin applied.
pub fn fit_distance(size: Vec3, fov_y_deg: f32, aspect: f32) -> f32 {
    let v_fov = fov_y_deg.to_radians();
    let h_fov = 2.0 * ((v_fov / 2.0).tan() * aspect).atan();
    let fit_height = (size.y / 2.0) / (v_fov / 2.0).tan();
    let fit_width = (size.x / 2.0) / (h_fov / 2.0).tan();
    fit_height.max(fit_width) * FIT_MARGIN
}

/// NDC-space bounding rectangle area of a world-space box, clamped
/// non-negative per axis. Used to score thumbnail camera candidates.
pub fn projected_area(camera: &Camera, aabb: &Aabb) -> f32 {
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    for corner in aabb.corners() {
        let p = camera.project_ndc(corner);
        min = min.min(Vec2::new(p.x, p.y));
        max = max.max(Vec2::new(p.x, p.y));
    }
    (max.x - min.x).max(0.0) * (max.y - min.y).max(0.0)
}

// ========================================================================
// Tests
// ========================================================================

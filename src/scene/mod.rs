//! Scene node and rotation state.
//!
//! Exactly one [`ModelNode`] is live per viewer. The node owns its mesh
//! buffers and transform; replacing the model drops the old buffers
//! outright ("dispose on replace") rather than leaving them to linger.

use crate::mesh::{Aabb, TriangleMesh};
use glam::{EulerRot, Mat4, Vec3};

/// Default continuous rotation speed in radians per second.
pub const DEFAULT_SPIN_SPEED: f32 = 0.7;

/// Rotation axis selector for the imperative control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Node transform: uniform scale, XYZ Euler rotation, then translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_euler(
                EulerRot::XYZ,
                self.rotation.x,
                self.rotation.y,
                self.rotation.z,
            )
            * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

/// The one live scene node: mesh buffers plus their current transform.
#[derive(Debug)]
pub struct ModelNode {
    pub mesh: TriangleMesh,
    pub transform: Transform,
    pub source: String,
}

impl ModelNode {
    pub fn new(mesh: TriangleMesh, source: impl Into<String>) -> Self {
        Self {
            mesh,
            transform: Transform::default(),
            source: source.into(),
        }
    }

    /// World-space bounding box of the node under its current transform.
    pub fn world_aabb(&self) -> Aabb {
        self.mesh.aabb().transform(self.transform.matrix())
    }
}

// ========================================================================
// RotationState
// ========================================================================

/// Per-axis continuous rotation toggles plus the upside-down flip.
///
/// Toggles are pure state mutation with no validation; several axes may
/// spin at once. The flip forces the X angle to exactly PI on every tick
/// unless continuous X rotation is enabled, which takes precedence.
#[derive(Debug, Clone, Copy)]
pub struct RotationState {
    pub spin_x: bool,
    pub spin_y: bool,
    pub spin_z: bool,
    pub speed: f32,
    pub flipped: bool,
}

impl Default for RotationState {
    fn default() -> Self {
        Self {
            spin_x: false,
            spin_y: false,
            spin_z: false,
            speed: DEFAULT_SPIN_SPEED,
            flipped: false,
        }
    }
}

impl RotationState {
    pub fn set_axis(&mut self, axis: Axis, on: bool) {
        match axis {
            Axis::X => self.spin_x = on,
            Axis::Y => self.spin_y = on,
            Axis::Z => self.spin_z = on,
        }
    }

    pub fn toggle_axis(&mut self, axis: Axis) {
        match axis {
            Axis::X => self.spin_x = !self.spin_x,
            Axis::Y => self.spin_y = !self.spin_y,
            Axis::Z => self.spin_z = !self.spin_z,
        }
    }

    /// Apply a positive speed override; non-positive values are ignored,
    /// matching the host-facing contract.
    pub fn override_speed(&mut self, speed: Option<f32>) {
        if let Some(speed) = speed {
            if speed > 0.0 {
                self.speed = speed;
            }
        }
    }

    /// Advance the node's rotation by `dt` seconds of enabled spin.
    /// Time-delta based, so the apparent speed is frame-rate independent.
    pub fn advance(&self, transform: &mut Transform, dt: f32) {
        if self.spin_x {
            transform.rotation.x += self.speed * dt;
        }
        if self.spin_y {
            transform.rotation.y += self.speed * dt;
        }
        if self.spin_z {
            transform.rotation.z += self.speed * dt;
        }
        if self.flipped && !self.spin_x {
            transform.rotation.x = std::f32::consts::PI;
        }
    }
}

/// Single explicit rotation step on one axis.
pub fn step_rotate(transform: &mut Transform, axis: Axis, radians: f32) {
    match axis {
        Axis::X => transform.rotation.x += radians,
        Axis::Y => transform.rotation.y += radians,
        Axis::Z => transform.rotation.z += radians,
    }
}

// ========================================================================
// Tests
// ========================================================================

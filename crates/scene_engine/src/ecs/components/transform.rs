//! Transform component for the ECS system
//!
//! Pure data component: position, Euler rotation and scale. The world matrix
//! is derived on demand and always composed as
//! `Translate * Rx * Ry * Rz * Scale`.

use serde::{Deserialize, Serialize};

use crate::ecs::Component;
use crate::foundation::math::{euler_xyz_to_matrix, Mat3, Mat4, Vec3};

/// Smallest magnitude a scale component may have
///
/// Keeps the world matrix invertible; picking needs the inverse.
pub const MIN_SCALE: f32 = 1e-3;

/// ECS Transform component
///
/// Rotation is stored as Euler angles in radians (see
/// [`euler_xyz_to_matrix`] for the composition order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformComponent {
    /// World space position
    pub position: Vec3,

    /// Euler angles in radians, XYZ convention
    pub rotation: Vec3,

    /// Scale factors, never zero on any axis
    pub scale: Vec3,
}

impl Component for TransformComponent {}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl TransformComponent {
    /// Create identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from position only
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create from position, rotation and scale
    pub fn from_parts(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale: sanitize_scale(scale),
        }
    }

    /// Builder pattern: Set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder pattern: Set rotation from Euler angles (radians, XYZ order)
    pub fn with_rotation_euler(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    /// Builder pattern: Set scale (uniform)
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.set_scale(Vec3::new(scale, scale, scale));
        self
    }

    /// Builder pattern: Set scale (non-uniform)
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.set_scale(scale);
        self
    }

    /// Set the scale, flooring near-zero components to [`MIN_SCALE`]
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = sanitize_scale(scale);
    }

    /// Rotation part of the world matrix
    pub fn rotation_matrix(&self) -> Mat3 {
        euler_xyz_to_matrix(self.rotation)
    }

    /// Local-to-world matrix: scale, then rotate, then translate
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation_matrix().to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// World-to-local matrix, `None` if the scale is degenerate
    pub fn inverse_world_matrix(&self) -> Option<Mat4> {
        self.world_matrix().try_inverse()
    }
}

/// Replace every scale component whose magnitude is below [`MIN_SCALE`]
/// with `+MIN_SCALE`. Negative (mirroring) scales are preserved.
pub fn sanitize_scale(scale: Vec3) -> Vec3 {
    scale.map(|s| if s.abs() < MIN_SCALE || !s.is_finite() { MIN_SCALE } else { s })
}

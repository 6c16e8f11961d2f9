//! Camera component
//!
//! Lens attributes for a scene camera. Placement comes from the entity's
//! transform; [`crate::render::Camera`] turns both into matrices.

use serde::{Deserialize, Serialize};

use crate::ecs::Component;

/// Camera lens attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraComponent {
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Whether this is the camera the viewport renders from
    pub active: bool,
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self {
            fov_y: 60.0_f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            active: true,
        }
    }
}

impl Component for CameraComponent {}

//! Sky and fog components

use serde::{Deserialize, Serialize};

use crate::ecs::Component;
use crate::foundation::math::Vec3;

/// Procedural sky attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyComponent {
    /// Color at the zenith
    pub zenith_color: Vec3,
    /// Color at the horizon
    pub horizon_color: Vec3,
    /// Direction towards the sun
    pub sun_direction: Vec3,
    /// Sun disc intensity
    pub sun_intensity: f32,
}

impl Default for SkyComponent {
    fn default() -> Self {
        Self {
            zenith_color: Vec3::new(0.25, 0.45, 0.85),
            horizon_color: Vec3::new(0.8, 0.85, 0.9),
            sun_direction: Vec3::new(0.3, 0.8, 0.2).normalize(),
            sun_intensity: 1.0,
        }
    }
}

impl Component for SkyComponent {}

/// Exponential height fog attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogComponent {
    /// Fog color
    pub color: Vec3,
    /// Density coefficient
    pub density: f32,
    /// Height below which fog is at full density
    pub height: f32,
    /// Falloff rate above `height`
    pub falloff: f32,
}

impl Default for FogComponent {
    fn default() -> Self {
        Self {
            color: Vec3::new(0.7, 0.75, 0.8),
            density: 0.02,
            height: 0.0,
            falloff: 0.2,
        }
    }
}

impl Component for FogComponent {}

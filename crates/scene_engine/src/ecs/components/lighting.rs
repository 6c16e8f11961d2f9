//! Lighting component for ECS
//!
//! Pure data component: lights are attribute bags. The light's position
//! comes from the entity's transform; lights are never pickable.

use serde::{Deserialize, Serialize};

use crate::ecs::Component;
use crate::foundation::math::Vec3;

/// Pure data component for lights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightComponent {
    /// The type of light (directional, point, or spot)
    pub light_type: LightType,
    /// RGB color values for the light (0.0 to 1.0 range)
    pub color: Vec3,
    /// Light intensity multiplier
    pub intensity: f32,
    /// Direction for directional/spot lights in world space
    pub direction: Vec3,
    /// Maximum range for point/spot lights
    pub range: f32,
    /// Inner cone angle for spot lights in radians
    pub inner_cone: f32,
    /// Outer cone angle for spot lights in radians
    pub outer_cone: f32,
    /// Whether the light is currently enabled
    pub enabled: bool,
    /// Whether this light should cast shadows
    pub cast_shadows: bool,
}

/// Types of lights supported by the lighting system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightType {
    /// Directional light (like sunlight) with parallel rays
    Directional,
    /// Point light that radiates in all directions from a position
    Point,
    /// Spot light that creates a cone of light from a position
    Spot,
}

impl Component for LightComponent {}

/// Factory functions for creating light components
pub struct LightFactory;

impl LightFactory {
    /// Create directional light component with world-space direction
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> LightComponent {
        LightComponent {
            light_type: LightType::Directional,
            color,
            intensity,
            direction: direction.normalize(),
            range: 0.0,
            inner_cone: 0.0,
            outer_cone: 0.0,
            enabled: true,
            cast_shadows: true,
        }
    }

    /// Create point light component
    pub fn point(color: Vec3, intensity: f32, range: f32) -> LightComponent {
        LightComponent {
            light_type: LightType::Point,
            color,
            intensity,
            direction: Vec3::new(0.0, -1.0, 0.0),
            range,
            inner_cone: 0.0,
            outer_cone: 0.0,
            enabled: true,
            cast_shadows: false,
        }
    }

    /// Create spot light component
    pub fn spot(
        direction: Vec3,
        color: Vec3,
        intensity: f32,
        range: f32,
        inner_cone: f32,
        outer_cone: f32,
    ) -> LightComponent {
        LightComponent {
            light_type: LightType::Spot,
            color,
            intensity,
            direction: direction.normalize(),
            range,
            inner_cone,
            outer_cone: outer_cone.max(inner_cone),
            enabled: true,
            cast_shadows: true,
        }
    }
}

//! # Engine Configuration
//!
//! Settings for every subsystem of the scene core, grouped the same way the
//! subsystems are: picking, gizmo interaction and ray tracing. All types are
//! serde-serializable so a whole [`EngineConfig`] can live in one TOML or
//! RON file.

use serde::{Serialize, Deserialize};

use crate::config::{Config, ConfigError};
use crate::ecs::components::pickable::layers;

/// # Picking Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickingConfig {
    /// Only entities whose layer bits intersect this mask are pickable
    pub layer_mask: u32,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self { layer_mask: layers::ALL }
    }
}

/// # Gizmo Configuration
///
/// Screen-space thresholds and sizing for the transform gizmo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GizmoConfig {
    /// Maximum cursor distance (pixels) to a handle for it to count as hovered
    pub hover_threshold_px: f32,
    /// Handle length as a fraction of the camera-to-object distance
    pub screen_fraction: f32,
    /// Multiplier applied to axis travel when scaling
    pub scale_sensitivity: f32,
    /// Number of segments used to approximate rotate rings
    pub ring_segments: u32,
    /// Smallest scale a drag may produce
    pub min_scale: f32,
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            hover_threshold_px: 12.0,
            screen_fraction: 0.15,
            scale_sensitivity: 1.0,
            ring_segments: 48,
            min_scale: crate::ecs::components::transform::MIN_SCALE,
        }
    }
}

/// Fixed ground plane instance placed in every TLAS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundPlaneConfig {
    /// World-space Y of the plane
    pub height: f32,
    /// Half size of the plane along X and Z
    pub half_extent: f32,
}

impl Default for GroundPlaneConfig {
    fn default() -> Self {
        Self {
            height: 0.0,
            half_extent: 50.0,
        }
    }
}

/// # Ray Tracing Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RayTracingConfig {
    /// Whether the hybrid ray-tracing path should be brought up at all
    pub enabled: bool,
    /// TLAS instance capacity; instances past this are skipped
    pub max_instances: u32,
    /// Ground plane instance
    pub ground_plane: GroundPlaneConfig,
}

impl Default for RayTracingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_instances: 1024,
            ground_plane: GroundPlaneConfig::default(),
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration consumed by the editor session and the
/// acceleration structure manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter (overridden by `RUST_LOG`)
    pub log_level: String,
    /// Picking settings
    pub picking: PickingConfig,
    /// Gizmo settings
    pub gizmo: GizmoConfig,
    /// Ray tracing settings
    pub ray_tracing: RayTracingConfig,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            picking: PickingConfig::default(),
            gizmo: GizmoConfig::default(),
            ray_tracing: RayTracingConfig::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the TLAS instance capacity
    pub fn with_max_instances(mut self, max_instances: u32) -> Self {
        self.ray_tracing.max_instances = max_instances;
        self
    }

    /// Enable or disable the ray tracing path
    pub fn with_ray_tracing(mut self, enabled: bool) -> Self {
        self.ray_tracing.enabled = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ray_tracing.max_instances == 0 {
            return Err(ConfigError::Invalid("max_instances must be at least 1".to_string()));
        }
        if self.gizmo.hover_threshold_px <= 0.0 {
            return Err(ConfigError::Invalid("hover_threshold_px must be positive".to_string()));
        }
        if self.gizmo.min_scale <= 0.0 {
            return Err(ConfigError::Invalid("min_scale must be positive".to_string()));
        }
        if self.gizmo.ring_segments < 8 {
            return Err(ConfigError::Invalid("ring_segments must be at least 8".to_string()));
        }
        if self.gizmo.screen_fraction <= 0.0 {
            return Err(ConfigError::Invalid("screen_fraction must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}

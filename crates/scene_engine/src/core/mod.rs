//! # Core Engine Module
//!
//! Shared abstractions the other subsystems depend on.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for picking, gizmo and ray tracing

pub mod config;

pub use config::{
    EngineConfig,
    PickingConfig,
    GizmoConfig,
    RayTracingConfig,
    GroundPlaneConfig,
};
pub use crate::config::{Config, ConfigError, ConfigFormat};

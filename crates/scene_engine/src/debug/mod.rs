//! Debug visualization
//!
//! Shapes are collected here and drawn by an external immediate-mode
//! renderer.

pub mod draw;

pub use draw::{DebugDrawSystem, DebugLine, Color, colors};

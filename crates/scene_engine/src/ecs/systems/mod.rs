//! ECS Systems module
//!
//! Systems read and mutate the world each frame.

pub mod picking_system;

pub use picking_system::{PickingSystem, PickHit};

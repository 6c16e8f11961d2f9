//! Entity-Component-System implementation
//!
//! Generational entity handles, one sparse-set table per component type and
//! a name index, all owned by [`World`].

pub mod world;
pub mod entity;
pub mod component;
pub mod storage;
pub mod components;
pub mod systems;

#[cfg(test)]
mod tests;

pub use world::{World, EcsError};
pub use entity::Entity;
pub use component::Component;
pub use systems::{PickingSystem, PickHit};

//! Spatial math for picking and gizmo hit testing
//!
//! Pure geometry with no rendering dependency: bounding boxes, rays, and
//! screen projection.

pub mod aabb;
pub mod ray;
pub mod projection;

pub use aabb::Aabb;
pub use ray::Ray;
pub use projection::{project_to_screen, distance_to_segment};

use crate::ecs::components::MeshComponent;

/// Source of object-space bounds for mesh components
///
/// Static primitives have fixed bounds; dynamic assets report whatever the
/// asset cache has resolved so far, or an inverted box when nothing is
/// loaded yet.
pub trait BoundsProvider {
    /// Object-space bounds of a dynamic asset, inverted if unresolved
    fn dynamic_bounds(&self, asset_id: &str) -> Aabb;

    /// Object-space bounds for any mesh component
    fn bounds_for(&self, mesh: &MeshComponent) -> Aabb {
        match mesh {
            MeshComponent::Static(primitive) => primitive.bounds(),
            MeshComponent::Dynamic { asset_id } => self.dynamic_bounds(asset_id),
        }
    }
}

/// Bounds provider with no dynamic assets; every dynamic mesh is unresolved
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticBoundsOnly;

impl BoundsProvider for StaticBoundsOnly {
    fn dynamic_bounds(&self, _asset_id: &str) -> Aabb {
        Aabb::inverted()
    }
}

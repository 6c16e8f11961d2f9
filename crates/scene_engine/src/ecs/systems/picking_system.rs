//! Ray picking against mesh entities
//!
//! Every entity with a transform and a mesh is a candidate. The world ray is
//! moved into each entity's object space and tested against the canonical
//! object-space bounds of its mesh, so rotated and non-uniformly scaled
//! entities are handled exactly without recomputing world bounds.

use crate::core::PickingConfig;
use crate::ecs::components::{MeshComponent, PickableComponent, TransformComponent};
use crate::ecs::{Entity, World};
use crate::foundation::math::{Mat4, Vec2};
use crate::spatial::{BoundsProvider, Ray};

/// Result of a successful pick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// The entity that was hit
    pub entity: Entity,

    /// Entry distance along the object-space ray
    pub distance: f32,
}

/// Nearest-hit picking over the entity store
///
/// # Usage
/// ```
/// # use scene_engine::ecs::{World, systems::PickingSystem};
/// # use scene_engine::ecs::components::{MeshComponent, TransformComponent};
/// # use scene_engine::spatial::{Ray, StaticBoundsOnly};
/// # use scene_engine::foundation::math::Vec3;
/// let mut world = World::new();
/// let cube = world.create_object("Cube").unwrap();
/// world.add_component(cube, TransformComponent::identity()).unwrap();
/// world.add_component(cube, MeshComponent::cube()).unwrap();
///
/// let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
/// let hit = PickingSystem::new().pick(&world, &ray, &StaticBoundsOnly).unwrap();
/// assert_eq!(hit.entity, cube);
/// ```
#[derive(Debug, Clone)]
pub struct PickingSystem {
    /// Layer mask for filtering entities that carry a [`PickableComponent`]
    layer_mask: u32,
}

impl PickingSystem {
    /// Create a picking system that accepts every layer
    pub fn new() -> Self {
        Self {
            layer_mask: u32::MAX,
        }
    }

    /// Create a picking system from configuration
    pub fn from_config(config: &PickingConfig) -> Self {
        Self {
            layer_mask: config.layer_mask,
        }
    }

    /// Set the layer mask for filtering pickable entities
    pub fn set_layer_mask(&mut self, mask: u32) {
        self.layer_mask = mask;
    }

    /// Current layer mask
    pub fn layer_mask(&self) -> u32 {
        self.layer_mask
    }

    /// Find the nearest entity hit by a world-space ray.
    ///
    /// Equal entry distances resolve to the entity created first, so repeated
    /// identical queries always return the same entity regardless of storage
    /// order.
    pub fn pick(&self, world: &World, ray: &Ray, bounds: &dyn BoundsProvider) -> Option<PickHit> {
        let mut best: Option<(PickHit, u64)> = None;

        for (entity, transform, mesh) in world.query2::<TransformComponent, MeshComponent>() {
            if let Some(pickable) = world.get_component::<PickableComponent>(entity) {
                if !pickable.accepts(self.layer_mask) {
                    continue;
                }
            }

            let aabb = bounds.bounds_for(mesh);
            if !aabb.is_valid() {
                // Dynamic asset not resolved yet
                continue;
            }

            let Some(inverse) = transform.inverse_world_matrix() else {
                continue;
            };
            let local_ray = ray.transformed(&inverse);

            let Some((enter, _exit)) = aabb.intersect_ray(local_ray.origin, local_ray.direction) else {
                continue;
            };
            if enter < 0.0 {
                continue;
            }

            let order = world.creation_index(entity).unwrap_or(u64::MAX);
            let closer = match &best {
                None => true,
                Some((hit, best_order)) => {
                    enter < hit.distance || (enter == hit.distance && order < *best_order)
                }
            };
            if closer {
                best = Some((PickHit { entity, distance: enter }, order));
            }
        }

        best.map(|(hit, _)| hit)
    }

    /// Pick through a screen pixel using the inverse view-projection matrix
    pub fn pick_screen(
        &self,
        world: &World,
        screen: Vec2,
        viewport: Vec2,
        inverse_view_projection: &Mat4,
        bounds: &dyn BoundsProvider,
    ) -> Option<PickHit> {
        let ray = Ray::from_screen(screen, viewport, inverse_view_projection)?;
        self.pick(world, &ray, bounds)
    }
}

impl Default for PickingSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{pickable::layers, LightFactory};
    use crate::foundation::math::Vec3;
    use crate::spatial::{Aabb, StaticBoundsOnly};
    use approx::assert_relative_eq;

    fn spawn_cube(world: &mut World, name: &str, transform: TransformComponent) -> Entity {
        let entity = world.create_object(name).unwrap();
        world.add_component(entity, transform).unwrap();
        world.add_component(entity, MeshComponent::cube()).unwrap();
        entity
    }

    fn forward_ray() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0))
    }

    struct FixedBounds(Aabb);

    impl BoundsProvider for FixedBounds {
        fn dynamic_bounds(&self, _asset_id: &str) -> Aabb {
            self.0
        }
    }

    #[test]
    fn test_cube_at_origin_is_hit_at_distance_four() {
        let mut world = World::new();
        let cube = spawn_cube(&mut world, "Cube", TransformComponent::identity());

        let hit = PickingSystem::new().pick(&world, &forward_ray(), &StaticBoundsOnly).unwrap();
        assert_eq!(hit.entity, cube);
        assert_relative_eq!(hit.distance, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_offset_cube_is_missed() {
        let mut world = World::new();
        spawn_cube(&mut world, "Far", TransformComponent::from_position(Vec3::new(10.0, 0.0, 0.0)));

        assert!(PickingSystem::new().pick(&world, &forward_ray(), &StaticBoundsOnly).is_none());
    }

    #[test]
    fn test_nearest_entity_wins() {
        let mut world = World::new();
        spawn_cube(&mut world, "Back", TransformComponent::from_position(Vec3::new(0.0, 0.0, 5.0)));
        let front = spawn_cube(&mut world, "Front", TransformComponent::identity());

        let hit = PickingSystem::new().pick(&world, &forward_ray(), &StaticBoundsOnly).unwrap();
        assert_eq!(hit.entity, front);
    }

    #[test]
    fn test_overlapping_cubes_resolve_to_first_created() {
        let mut world = World::new();
        let first = spawn_cube(&mut world, "First", TransformComponent::identity());
        let second = spawn_cube(&mut world, "Second", TransformComponent::identity());

        let picking = PickingSystem::new();
        for _ in 0..8 {
            let hit = picking.pick(&world, &forward_ray(), &StaticBoundsOnly).unwrap();
            assert_eq!(hit.entity, first);
        }

        // Churn the transform storage order; the winner must not change
        world.remove_component::<TransformComponent>(first);
        world.add_component(first, TransformComponent::identity()).unwrap();
        let hit = picking.pick(&world, &forward_ray(), &StaticBoundsOnly).unwrap();
        assert_eq!(hit.entity, first);
        assert_ne!(hit.entity, second);
    }

    #[test]
    fn test_non_uniform_scale_is_respected() {
        let mut world = World::new();
        let wide = spawn_cube(
            &mut world,
            "Wide",
            TransformComponent::from_position(Vec3::new(4.0, 0.0, 0.0))
                .with_scale(Vec3::new(5.0, 1.0, 1.0)),
        );

        let hit = PickingSystem::new().pick(&world, &forward_ray(), &StaticBoundsOnly).unwrap();
        assert_eq!(hit.entity, wide);
    }

    #[test]
    fn test_rotated_plane_is_hit() {
        let mut world = World::new();
        let wall = world.create_object("Wall").unwrap();
        world
            .add_component(
                wall,
                TransformComponent::identity().with_rotation_euler(std::f32::consts::FRAC_PI_2, 0.0, 0.0),
            )
            .unwrap();
        world.add_component(wall, MeshComponent::plane()).unwrap();

        let hit = PickingSystem::new().pick(&world, &forward_ray(), &StaticBoundsOnly).unwrap();
        assert_eq!(hit.entity, wall);
    }

    #[test]
    fn test_unresolved_dynamic_mesh_is_skipped() {
        let mut world = World::new();
        let model = world.create_object("Model").unwrap();
        world.add_component(model, TransformComponent::identity()).unwrap();
        world.add_component(model, MeshComponent::dynamic("missing.obj")).unwrap();

        let picking = PickingSystem::new();
        assert!(picking.pick(&world, &forward_ray(), &StaticBoundsOnly).is_none());

        let hit = picking.pick(&world, &forward_ray(), &FixedBounds(Aabb::cube())).unwrap();
        assert_eq!(hit.entity, model);
    }

    #[test]
    fn test_entities_without_mesh_are_never_candidates() {
        let mut world = World::new();
        let light = world.create_object("Light").unwrap();
        world.add_component(light, TransformComponent::identity()).unwrap();
        world.add_component(light, LightFactory::point(Vec3::new(1.0, 1.0, 1.0), 1.0, 10.0)).unwrap();

        assert!(PickingSystem::new().pick(&world, &forward_ray(), &StaticBoundsOnly).is_none());
    }

    #[test]
    fn test_ray_starting_inside_is_not_a_hit() {
        let mut world = World::new();
        spawn_cube(&mut world, "Around", TransformComponent::identity().with_uniform_scale(10.0));

        assert!(PickingSystem::new().pick(&world, &forward_ray(), &StaticBoundsOnly).is_none());
    }

    #[test]
    fn test_pickable_component_filters() {
        let mut world = World::new();
        let front = spawn_cube(&mut world, "Front", TransformComponent::identity());
        let back = spawn_cube(&mut world, "Back", TransformComponent::from_position(Vec3::new(0.0, 0.0, 5.0)));

        world.add_component(front, PickableComponent::new().with_enabled(false)).unwrap();
        let picking = PickingSystem::new();
        assert_eq!(picking.pick(&world, &forward_ray(), &StaticBoundsOnly).unwrap().entity, back);

        world.add_component(back, PickableComponent::new().with_layer_bits(layers::LOCKED)).unwrap();
        let mut world_only = PickingSystem::new();
        world_only.set_layer_mask(layers::WORLD);
        assert!(world_only.pick(&world, &forward_ray(), &StaticBoundsOnly).is_none());
    }
}

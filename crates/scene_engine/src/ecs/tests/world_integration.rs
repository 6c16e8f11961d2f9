//! Integration tests for the entity store
//!
//! Long create/rename/destroy sequences checked against the name index, and
//! picking through a camera the way the editor drives it.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ecs::components::{MeshComponent, NameComponent, TransformComponent};
use crate::ecs::systems::PickingSystem;
use crate::ecs::{EcsError, Entity, World};
use crate::foundation::math::{Vec2, Vec3};
use crate::render::Camera;
use crate::spatial::StaticBoundsOnly;

fn assert_names_unique(world: &World) {
    let mut seen = HashSet::new();
    for (entity, name) in world.query::<NameComponent>() {
        assert!(seen.insert(name.name.clone()), "duplicate live name {}", name.name);
        assert_eq!(world.get_object(&name.name), Ok(entity));
    }
    assert_eq!(seen.len(), world.entity_count());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_stay_unique_under_random_sequences() {
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut world = World::new();
            let mut live: Vec<Entity> = Vec::new();

            for _ in 0..300 {
                let name = format!("Object{}", rng.gen_range(0..12));
                match rng.gen_range(0..3) {
                    0 => match world.create_object(name.clone()) {
                        Ok(entity) => live.push(entity),
                        Err(err) => assert_eq!(err, EcsError::DuplicateName(name)),
                    },
                    1 if !live.is_empty() => {
                        let entity = live[rng.gen_range(0..live.len())];
                        let owner = world.get_object(&name).ok();
                        match world.rename_entity(entity, name.clone()) {
                            Ok(()) => assert_eq!(world.name_of(entity), Some(name.as_str())),
                            Err(err) => {
                                assert_eq!(err, EcsError::DuplicateName(name));
                                assert!(owner.is_some_and(|owner| owner != entity));
                            }
                        }
                    }
                    _ if !live.is_empty() => {
                        let entity = live.swap_remove(rng.gen_range(0..live.len()));
                        world.destroy_entity(entity);
                        assert!(!world.is_alive(entity));
                    }
                    _ => {}
                }
                assert_names_unique(&world);
            }
        }
    }

    #[test]
    fn test_names_cannot_bypass_the_index() {
        let mut world = World::new();
        let a = world.create_object("A").unwrap();
        let b = world.create_object("B").unwrap();

        assert!(matches!(
            world.add_component(b, NameComponent::new("A")),
            Err(EcsError::ManagedComponent(_))
        ));
        assert_eq!(world.name_of(b), Some("B"));
        assert_eq!(world.get_object("B"), Ok(b));

        assert!(world.remove_component::<NameComponent>(a).is_none());
        assert_eq!(world.name_of(a), Some("A"));
        assert!(world.get_component_mut::<NameComponent>(a).is_none());
        assert_eq!(world.query_mut::<NameComponent>().count(), 0);

        world.rename_entity(a, "C").unwrap();
        assert_eq!(world.get_object("C"), Ok(a));
        assert_names_unique(&world);

        // Snapshots of the world still restore cleanly
        let snapshot = world.snapshot();
        let mut restored = World::new();
        restored.restore(snapshot).unwrap();
        assert!(restored.has_object("B") && restored.has_object("C"));
    }

    #[test]
    fn test_destroying_twice_leaves_store_unchanged() {
        let mut world = World::new();
        let keep = world.create_object("Keep").unwrap();
        let gone = world.create_object("Gone").unwrap();
        world.add_component(keep, TransformComponent::identity()).unwrap();

        world.destroy_entity(gone);
        world.destroy_entity(gone);
        world.destroy_entity(Entity::null());

        assert_eq!(world.entity_count(), 1);
        assert!(world.is_alive(keep));
        assert!(world.has_component::<TransformComponent>(keep));
        assert!(!world.has_object("Gone"));
    }

    #[test]
    fn test_stale_handle_does_not_alias_reused_slot() {
        let mut world = World::new();
        let old = world.create_object("Old").unwrap();
        world.destroy_entity(old);
        let new = world.create_object("New").unwrap();

        assert_ne!(old, new);
        assert!(world.get_component::<NameComponent>(old).is_none());
        assert_eq!(world.add_component(old, TransformComponent::identity()), Err(EcsError::InvalidEntity(old)));
    }

    #[test]
    fn test_click_through_camera_picks_cube() {
        let mut world = World::new();
        let cube = world.create_object("Cube").unwrap();
        world.add_component(cube, TransformComponent::identity()).unwrap();
        world.add_component(cube, MeshComponent::cube()).unwrap();

        let viewport = Vec2::new(800.0, 600.0);
        let camera = Camera::perspective(Vec3::new(0.0, 0.0, -5.0), 60.0, viewport.x / viewport.y, 0.1, 100.0);
        let inverse = camera.inverse_view_projection().unwrap();

        let hit = PickingSystem::new()
            .pick_screen(&world, viewport * 0.5, viewport, &inverse, &StaticBoundsOnly)
            .unwrap();
        assert_eq!(hit.entity, cube);
        // The ray starts on the near plane, 0.1 in front of the camera
        approx::assert_relative_eq!(hit.distance, 3.9, epsilon = 1e-3);

        let corner = PickingSystem::new().pick_screen(
            &world,
            Vec2::new(5.0, 5.0),
            viewport,
            &inverse,
            &StaticBoundsOnly,
        );
        assert!(corner.is_none());
    }
}

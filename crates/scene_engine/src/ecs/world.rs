//! ECS World implementation
//!
//! The world owns every entity, one sparse-set table per component type and
//! the name index. It is an explicitly owned object: subsystems receive
//! `&World` / `&mut World`, there is no process-wide registry.

use std::any::TypeId;
use std::collections::HashMap;

use slotmap::{DefaultKey, SlotMap};
use thiserror::Error;

use super::components::NameComponent;
use super::storage::{ComponentStorage, ErasedStorage};
use super::{Component, Entity};

/// Entity store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Another live entity already uses this name
    #[error("An object named '{0}' already exists")]
    DuplicateName(String),

    /// No live entity has this name
    #[error("No object named '{0}'")]
    NotFound(String),

    /// The handle refers to a destroyed or never-created entity
    #[error("Entity {0:?} is not alive")]
    InvalidEntity(Entity),

    /// The component type is owned by the world and cannot be attached directly
    #[error("{0} is managed by the world")]
    ManagedComponent(&'static str),
}

#[derive(Debug, Clone, Copy)]
struct EntityRecord {
    creation_index: u64,
}

/// ECS World containing all entities and components
pub struct World {
    entities: SlotMap<DefaultKey, EntityRecord>,
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
    names: HashMap<String, Entity>,
    next_creation_index: u64,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self {
            entities: SlotMap::new(),
            storages: HashMap::new(),
            names: HashMap::new(),
            next_creation_index: 0,
        }
    }

    /// Create a named entity.
    ///
    /// The entity starts with a [`NameComponent`] attached.
    pub fn create_object(&mut self, name: impl Into<String>) -> Result<Entity, EcsError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(EcsError::DuplicateName(name));
        }

        let creation_index = self.next_creation_index;
        self.next_creation_index += 1;

        let entity = Entity::from_key(self.entities.insert(EntityRecord { creation_index }));
        self.names.insert(name.clone(), entity);
        self.storage_mut::<NameComponent>().insert(entity, NameComponent::new(name));

        Ok(entity)
    }

    /// Destroy an entity, detaching all components and its name.
    ///
    /// Stale or null handles are ignored.
    pub fn destroy_entity(&mut self, entity: Entity) {
        if self.entities.remove(entity.key()).is_none() {
            return;
        }

        let name = self
            .get_component::<NameComponent>(entity)
            .map(|name| name.name.clone());
        if let Some(name) = name {
            self.names.remove(&name);
        }

        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
    }

    /// Rename an entity.
    ///
    /// Fails without touching any state if another live entity already uses
    /// `new_name`. Renaming an entity to its current name succeeds.
    pub fn rename_entity(&mut self, entity: Entity, new_name: impl Into<String>) -> Result<(), EcsError> {
        let new_name = new_name.into();
        if !self.is_alive(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }

        match self.names.get(&new_name) {
            Some(&owner) if owner == entity => return Ok(()),
            Some(_) => {
                log::debug!("Rename to '{}' rejected: name in use", new_name);
                return Err(EcsError::DuplicateName(new_name));
            }
            None => {}
        }

        let old_name = self
            .get_component::<NameComponent>(entity)
            .map(|name| name.name.clone());
        if let Some(old_name) = old_name {
            self.names.remove(&old_name);
        }

        self.names.insert(new_name.clone(), entity);
        self.storage_mut::<NameComponent>().insert(entity, NameComponent::new(new_name));
        Ok(())
    }

    /// Whether a live entity has this name
    pub fn has_object(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Look up an entity by name
    pub fn get_object(&self, name: &str) -> Result<Entity, EcsError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| EcsError::NotFound(name.to_string()))
    }

    /// Name of an entity, if alive and named
    pub fn name_of(&self, entity: Entity) -> Option<&str> {
        self.get_component::<NameComponent>(entity).map(|name| name.name.as_str())
    }

    /// Whether the handle refers to a live entity
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity.key())
    }

    /// Creation order of a live entity.
    ///
    /// Strictly increasing over the lifetime of the world and never reused,
    /// so it is a stable ordering key across destroy/create cycles.
    pub fn creation_index(&self, entity: Entity) -> Option<u64> {
        self.entities.get(entity.key()).map(|record| record.creation_index)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Destroy every entity
    pub fn clear(&mut self) {
        self.entities.clear();
        self.names.clear();
        for storage in self.storages.values_mut() {
            storage.clear();
        }
    }

    /// Attach a component, replacing any existing one of the same type.
    ///
    /// Returns the replaced component. Fails for dead entities and for
    /// [`NameComponent`], which only changes through
    /// [`World::rename_entity`].
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<Option<T>, EcsError> {
        if !self.is_alive(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }
        if Self::is_managed::<T>() {
            return Err(EcsError::ManagedComponent(std::any::type_name::<T>()));
        }
        Ok(self.storage_mut::<T>().insert(entity, component))
    }

    /// Detach a component.
    ///
    /// Names stay attached until the entity is destroyed.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if Self::is_managed::<T>() {
            return None;
        }
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any_mut().downcast_mut::<ComponentStorage<T>>())
            .and_then(|storage| storage.remove(entity))
    }

    /// Get a component from an entity
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    /// Get a mutable component from an entity.
    ///
    /// Always `None` for [`NameComponent`].
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if Self::is_managed::<T>() {
            return None;
        }
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any_mut().downcast_mut::<ComponentStorage<T>>())
            .and_then(|storage| storage.get_mut(entity))
    }

    /// Whether an entity carries a component
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.storage::<T>().is_some_and(|storage| storage.contains(entity))
    }

    /// Iterate every entity carrying `T`.
    ///
    /// The iterator is lazy; calling `query` again restarts it. Order follows
    /// the dense storage and changes when components are removed.
    pub fn query<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.storage::<T>().into_iter().flat_map(|storage| storage.iter())
    }

    /// Iterate every entity carrying both `A` and `B`
    pub fn query2<A: Component, B: Component>(&self) -> impl Iterator<Item = (Entity, &A, &B)> + '_ {
        let others = self.storage::<B>();
        self.query::<A>().filter_map(move |(entity, a)| {
            let b = others?.get(entity)?;
            Some((entity, a, b))
        })
    }

    /// Iterate every entity carrying `T`, mutably.
    ///
    /// Yields nothing for [`NameComponent`].
    pub fn query_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        let managed = Self::is_managed::<T>();
        self.storages
            .get_mut(&TypeId::of::<T>())
            .filter(|_| !managed)
            .and_then(|storage| storage.as_any_mut().downcast_mut::<ComponentStorage<T>>())
            .into_iter()
            .flat_map(|storage| storage.iter_mut())
    }

    /// Iterate all live entities
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys().map(Entity::from_key)
    }

    /// Component types whose changes must go through the name index
    fn is_managed<T: Component>() -> bool {
        TypeId::of::<T>() == TypeId::of::<NameComponent>()
    }

    fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any().downcast_ref::<ComponentStorage<T>>())
    }

    fn storage_mut<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()));

        match storage.as_any_mut().downcast_mut::<ComponentStorage<T>>() {
            Some(typed) => typed,
            None => unreachable!("component storage registered under the wrong TypeId"),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::TransformComponent;

    #[test]
    fn test_create_object_attaches_name() {
        let mut world = World::new();
        let cube = world.create_object("Cube").unwrap();

        assert!(world.has_object("Cube"));
        assert_eq!(world.get_object("Cube"), Ok(cube));
        assert_eq!(world.name_of(cube), Some("Cube"));
        assert!(world.has_component::<NameComponent>(cube));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut world = World::new();
        world.create_object("Cube").unwrap();
        assert_eq!(
            world.create_object("Cube"),
            Err(EcsError::DuplicateName("Cube".to_string()))
        );
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_get_missing_object_is_not_found() {
        let world = World::new();
        assert_eq!(world.get_object("Ghost"), Err(EcsError::NotFound("Ghost".to_string())));
        assert!(!world.has_object("Ghost"));
    }

    #[test]
    fn test_destroy_removes_components_and_name() {
        let mut world = World::new();
        let cube = world.create_object("Cube").unwrap();
        world.add_component(cube, TransformComponent::default()).unwrap();

        world.destroy_entity(cube);

        assert!(!world.is_alive(cube));
        assert!(!world.has_object("Cube"));
        assert!(world.get_component::<TransformComponent>(cube).is_none());
        assert_eq!(world.query::<TransformComponent>().count(), 0);

        // The name is free again
        assert!(world.create_object("Cube").is_ok());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut world = World::new();
        let cube = world.create_object("Cube").unwrap();
        let other = world.create_object("Other").unwrap();

        world.destroy_entity(cube);
        world.destroy_entity(cube);
        world.destroy_entity(Entity::null());

        assert_eq!(world.entity_count(), 1);
        assert!(world.is_alive(other));
        assert_eq!(world.get_object("Other"), Ok(other));
    }

    #[test]
    fn test_stale_handle_does_not_alias_new_entity() {
        let mut world = World::new();
        let old = world.create_object("A").unwrap();
        world.destroy_entity(old);
        let new = world.create_object("B").unwrap();

        assert_ne!(old, new);
        assert!(world.name_of(old).is_none());
        world.destroy_entity(old);
        assert!(world.is_alive(new));
    }

    #[test]
    fn test_rename_success_and_collision() {
        let mut world = World::new();
        let a = world.create_object("A").unwrap();
        let b = world.create_object("B").unwrap();

        assert!(world.rename_entity(a, "C").is_ok());
        assert_eq!(world.get_object("C"), Ok(a));
        assert!(!world.has_object("A"));

        assert_eq!(
            world.rename_entity(a, "B"),
            Err(EcsError::DuplicateName("B".to_string()))
        );
        assert_eq!(world.name_of(a), Some("C"));
        assert_eq!(world.get_object("B"), Ok(b));

        assert!(world.rename_entity(b, "B").is_ok());
    }

    #[test]
    fn test_rename_dead_entity_fails() {
        let mut world = World::new();
        let a = world.create_object("A").unwrap();
        world.destroy_entity(a);
        assert_eq!(world.rename_entity(a, "Z"), Err(EcsError::InvalidEntity(a)));
        assert!(!world.has_object("Z"));
    }

    #[test]
    fn test_query2_joins_components() {
        let mut world = World::new();
        let a = world.create_object("A").unwrap();
        let _b = world.create_object("B").unwrap();
        world.add_component(a, TransformComponent::default()).unwrap();

        let joined: Vec<_> = world.query2::<NameComponent, TransformComponent>().collect();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].0, a);

        // Restartable
        assert_eq!(world.query2::<NameComponent, TransformComponent>().count(), 1);
    }

    #[test]
    fn test_add_component_to_dead_entity_fails() {
        let mut world = World::new();
        let a = world.create_object("A").unwrap();
        world.destroy_entity(a);
        assert!(world.add_component(a, TransformComponent::default()).is_err());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut world = World::new();
        let a = world.create_object("A").unwrap();
        world.add_component(a, TransformComponent::default()).unwrap();
        world.clear();

        assert_eq!(world.entity_count(), 0);
        assert!(!world.has_object("A"));
        assert_eq!(world.query::<TransformComponent>().count(), 0);
    }

    #[test]
    fn test_creation_index_is_monotonic() {
        let mut world = World::new();
        let a = world.create_object("A").unwrap();
        world.destroy_entity(a);
        let b = world.create_object("B").unwrap();
        let c = world.create_object("C").unwrap();
        assert!(world.creation_index(b).unwrap() < world.creation_index(c).unwrap());
        assert!(world.creation_index(a).is_none());
    }

    #[test]
    fn test_entity_bits_roundtrip() {
        let mut world = World::new();
        let a = world.create_object("A").unwrap();
        assert_eq!(Entity::from_bits(a.to_bits()), a);
    }
}

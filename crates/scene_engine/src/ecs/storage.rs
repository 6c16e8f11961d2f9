//! Sparse-set component storage
//!
//! One table per component type. The sparse side maps an entity slot to a
//! dense index; the dense side keeps components packed for iteration.

use std::any::Any;

use slotmap::{DefaultKey, SecondaryMap};

use super::{Component, Entity};

/// Typed sparse-set storage for a single component type
pub struct ComponentStorage<T: Component> {
    sparse: SecondaryMap<DefaultKey, usize>,
    dense_entities: Vec<Entity>,
    dense_components: Vec<T>,
}

impl<T: Component> ComponentStorage<T> {
    /// Create an empty storage
    pub fn new() -> Self {
        Self {
            sparse: SecondaryMap::new(),
            dense_entities: Vec::new(),
            dense_components: Vec::new(),
        }
    }

    /// Insert or replace the component for an entity, returning the old value
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        if let Some(&index) = self.sparse.get(entity.key()) {
            return Some(std::mem::replace(&mut self.dense_components[index], component));
        }

        self.sparse.insert(entity.key(), self.dense_components.len());
        self.dense_entities.push(entity);
        self.dense_components.push(component);
        None
    }

    /// Remove the component for an entity
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let index = self.sparse.remove(entity.key())?;
        let last = self.dense_components.len() - 1;

        if index != last {
            let moved = self.dense_entities[last];
            self.sparse.insert(moved.key(), index);
        }

        self.dense_entities.swap_remove(index);
        Some(self.dense_components.swap_remove(index))
    }

    /// Get the component for an entity
    pub fn get(&self, entity: Entity) -> Option<&T> {
        let index = *self.sparse.get(entity.key())?;
        self.dense_components.get(index)
    }

    /// Get the component for an entity mutably
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let index = *self.sparse.get(entity.key())?;
        self.dense_components.get_mut(index)
    }

    /// Whether the entity has this component
    pub fn contains(&self, entity: Entity) -> bool {
        self.sparse.contains_key(entity.key())
    }

    /// Number of stored components
    pub fn len(&self) -> usize {
        self.dense_components.len()
    }

    /// Whether the storage is empty
    pub fn is_empty(&self) -> bool {
        self.dense_components.is_empty()
    }

    /// Iterate `(entity, component)` pairs in dense order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.dense_entities.iter().copied().zip(self.dense_components.iter())
    }

    /// Iterate `(entity, component)` pairs mutably in dense order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.dense_entities.iter().copied().zip(self.dense_components.iter_mut())
    }
}

impl<T: Component> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a component storage
///
/// Lets the world detach every component of an entity without knowing the
/// concrete component types.
pub trait ErasedStorage {
    /// Drop this entity's component, if any
    fn remove_entity(&mut self, entity: Entity);

    /// Drop all components
    fn clear(&mut self);

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStorage for ComponentStorage<T> {
    fn remove_entity(&mut self, entity: Entity) {
        self.remove(entity);
    }

    fn clear(&mut self) {
        self.sparse.clear();
        self.dense_entities.clear();
        self.dense_components.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

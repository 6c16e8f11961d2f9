//! Name component

use serde::{Deserialize, Serialize};

use crate::ecs::Component;

/// Human-readable, world-unique entity name.
///
/// Attached by [`World::create_object`](crate::ecs::World::create_object)
/// and kept in sync with the world's name index; change it through
/// [`World::rename_entity`](crate::ecs::World::rename_entity), never by
/// replacing the component directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameComponent {
    /// The name
    pub name: String,
}

impl NameComponent {
    /// Create a name component
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Component for NameComponent {}

//! Serializable world snapshots
//!
//! Entity handles are not persisted; names are the stable identity across a
//! save/load cycle.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ecs::components::{
    CameraComponent, FogComponent, LightComponent, MeshComponent, PickableComponent, SkyComponent,
    TransformComponent,
};
use crate::ecs::{Component, EcsError, Entity, World};

/// One entity and its persistent components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Unique entity name
    pub name: String,
    /// Placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformComponent>,
    /// Geometry reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshComponent>,
    /// Light attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<LightComponent>,
    /// Camera lens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraComponent>,
    /// Sky attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sky: Option<SkyComponent>,
    /// Fog attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fog: Option<FogComponent>,
    /// Picking filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickable: Option<PickableComponent>,
}

impl EntityRecord {
    /// Record with a name and no components
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: None,
            mesh: None,
            light: None,
            camera: None,
            sky: None,
            fog: None,
            pickable: None,
        }
    }

    fn capture(world: &World, entity: Entity, name: &str) -> Self {
        Self {
            name: name.to_string(),
            transform: world.get_component(entity).cloned(),
            mesh: world.get_component(entity).cloned(),
            light: world.get_component(entity).cloned(),
            camera: world.get_component(entity).cloned(),
            sky: world.get_component(entity).cloned(),
            fog: world.get_component(entity).cloned(),
            pickable: world.get_component(entity).cloned(),
        }
    }

    fn apply(self, world: &mut World) -> Result<Entity, EcsError> {
        let entity = world.create_object(self.name)?;
        // Files may carry degenerate scales that were never sanitized
        let transform = self.transform.map(|mut transform| {
            let scale = transform.scale;
            transform.set_scale(scale);
            transform
        });
        attach(world, entity, transform)?;
        attach(world, entity, self.mesh)?;
        attach(world, entity, self.light)?;
        attach(world, entity, self.camera)?;
        attach(world, entity, self.sky)?;
        attach(world, entity, self.fog)?;
        attach(world, entity, self.pickable)?;
        Ok(entity)
    }
}

fn attach<T: Component>(world: &mut World, entity: Entity, component: Option<T>) -> Result<(), EcsError> {
    if let Some(component) = component {
        world.add_component(entity, component)?;
    }
    Ok(())
}

/// Every entity of a world, in creation order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Entity records
    pub entities: Vec<EntityRecord>,
}

impl World {
    /// Capture every live entity, ordered by creation
    pub fn snapshot(&self) -> WorldSnapshot {
        let mut live: Vec<(u64, Entity)> = self
            .entities()
            .filter_map(|entity| Some((self.creation_index(entity)?, entity)))
            .collect();
        live.sort_by_key(|(order, _)| *order);

        let entities = live
            .into_iter()
            .filter_map(|(_, entity)| Some(EntityRecord::capture(self, entity, self.name_of(entity)?)))
            .collect();
        WorldSnapshot { entities }
    }

    /// Replace the world's contents with a snapshot.
    ///
    /// Names are checked before anything is touched: on a duplicate the
    /// error is returned and this world keeps its current contents. Handles
    /// from before a successful restore are stale afterwards.
    pub fn restore(&mut self, snapshot: WorldSnapshot) -> Result<(), EcsError> {
        let mut names = HashSet::with_capacity(snapshot.entities.len());
        for record in &snapshot.entities {
            if !names.insert(record.name.as_str()) {
                log::warn!("Scene rejected: duplicate name '{}'", record.name);
                return Err(EcsError::DuplicateName(record.name.clone()));
            }
        }

        self.clear();
        for record in snapshot.entities {
            record.apply(self)?;
        }
        log::debug!("Restored {} entities", self.entity_count());
        Ok(())
    }
}

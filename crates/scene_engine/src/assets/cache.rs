//! Load-once cache for dynamic mesh assets
//!
//! Each asset id is resolved at most once. Failures are remembered so a
//! broken asset is reported a single time instead of every frame; the
//! entities using it simply stay unresolved.

use std::collections::HashMap;

use crate::ecs::components::MeshComponent;
use crate::ecs::World;
use crate::spatial::{Aabb, BoundsProvider};

use super::{MeshAssetSource, MeshData};

#[derive(Debug)]
enum CacheEntry {
    Loaded(MeshData),
    Failed,
}

/// Cache of resolved mesh assets keyed by asset id
#[derive(Debug, Default)]
pub struct MeshAssetCache {
    entries: HashMap<String, CacheEntry>,
    load_attempts: usize,
}

impl MeshAssetCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `asset_id`, loading it from `source` on first request
    pub fn resolve(&mut self, asset_id: &str, source: &dyn MeshAssetSource) -> Option<&MeshData> {
        if !self.entries.contains_key(asset_id) {
            self.load_attempts += 1;
            let entry = match source.load(asset_id) {
                Ok(mesh) => {
                    log::info!("Resolved mesh asset '{}' ({} triangles)", asset_id, mesh.triangle_count());
                    CacheEntry::Loaded(mesh)
                }
                Err(err) => {
                    log::warn!("Failed to resolve mesh asset '{}': {}", asset_id, err);
                    CacheEntry::Failed
                }
            };
            self.entries.insert(asset_id.to_string(), entry);
        }

        self.get(asset_id)
    }

    /// Resolve every dynamic mesh referenced by the world
    pub fn resolve_world(&mut self, world: &World, source: &dyn MeshAssetSource) {
        let pending: Vec<String> = world
            .query::<MeshComponent>()
            .filter_map(|(_, mesh)| mesh.asset_id())
            .filter(|asset_id| !self.entries.contains_key(*asset_id))
            .map(str::to_string)
            .collect();

        for asset_id in pending {
            self.resolve(&asset_id, source);
        }
    }

    /// Already-resolved geometry, without loading
    pub fn get(&self, asset_id: &str) -> Option<&MeshData> {
        match self.entries.get(asset_id) {
            Some(CacheEntry::Loaded(mesh)) => Some(mesh),
            _ => None,
        }
    }

    /// Whether resolution was attempted and failed
    pub fn is_failed(&self, asset_id: &str) -> bool {
        matches!(self.entries.get(asset_id), Some(CacheEntry::Failed))
    }

    /// Number of calls made into an asset source
    pub fn load_attempts(&self) -> usize {
        self.load_attempts
    }

    /// Forget everything, so failed assets are retried
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl BoundsProvider for MeshAssetCache {
    fn dynamic_bounds(&self, asset_id: &str) -> Aabb {
        self.get(asset_id).map_or_else(Aabb::inverted, |mesh| mesh.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetError;
    use crate::ecs::components::TransformComponent;
    use crate::foundation::math::Vec3;
    use std::cell::Cell;

    struct CountingSource {
        loads: Cell<usize>,
    }

    impl MeshAssetSource for CountingSource {
        fn load(&self, asset_id: &str) -> Result<MeshData, AssetError> {
            self.loads.set(self.loads.get() + 1);
            match asset_id {
                "cube" => Ok(MeshData::cube()),
                _ => Err(AssetError::NotFound(asset_id.to_string())),
            }
        }
    }

    fn source() -> CountingSource {
        CountingSource { loads: Cell::new(0) }
    }

    #[test]
    fn test_asset_loaded_once() {
        let source = source();
        let mut cache = MeshAssetCache::new();

        assert!(cache.resolve("cube", &source).is_some());
        assert!(cache.resolve("cube", &source).is_some());
        assert_eq!(source.loads.get(), 1);
        assert_eq!(cache.dynamic_bounds("cube"), Aabb::cube());
    }

    #[test]
    fn test_failure_is_cached() {
        crate::foundation::logging::init_for_tests();
        let source = source();
        let mut cache = MeshAssetCache::new();

        assert!(cache.resolve("broken", &source).is_none());
        assert!(cache.resolve("broken", &source).is_none());
        assert_eq!(source.loads.get(), 1);
        assert!(cache.is_failed("broken"));
        assert!(!cache.dynamic_bounds("broken").is_valid());

        cache.clear();
        cache.resolve("broken", &source);
        assert_eq!(source.loads.get(), 2);
    }

    #[test]
    fn test_resolve_world_visits_each_id_once() {
        let mut world = World::new();
        for (i, asset) in ["cube", "cube", "broken"].iter().enumerate() {
            let entity = world.create_object(format!("Model{}", i)).unwrap();
            world.add_component(entity, TransformComponent::from_position(Vec3::x() * i as f32)).unwrap();
            world.add_component(entity, MeshComponent::dynamic(*asset)).unwrap();
        }

        let source = source();
        let mut cache = MeshAssetCache::new();
        cache.resolve_world(&world, &source);
        cache.resolve_world(&world, &source);

        assert_eq!(source.loads.get(), 2);
        assert_eq!(cache.load_attempts(), 2);
        assert!(cache.get("cube").is_some());
    }
}

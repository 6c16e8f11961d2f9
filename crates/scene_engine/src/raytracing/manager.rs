//! BLAS/TLAS lifecycle for the hybrid ray-tracing path
//!
//! One BLAS per distinct geometry (the shared cube, the plane, one per
//! dynamic asset id) and a single TLAS holding an instance per mesh entity.
//! Any device failure turns the feature off for the rest of the session;
//! rasterization never depends on this module.

use std::collections::{HashMap, HashSet};

use crate::assets::{MeshAssetCache, MeshAssetSource, MeshData};
use crate::core::RayTracingConfig;
use crate::ecs::components::{MeshComponent, PrimitiveMesh, TransformComponent};
use crate::ecs::World;
use crate::foundation::math::{Mat4, Vec3};
use crate::spatial::Aabb;

use super::backend::{AccelerationStructureBackend, BackendError, BackendResult};
use super::types::{
    AccelerationStructureHandle, AccelerationStructureType, BlasBuildInput, BufferHandle, BufferUsage,
    InstanceFlags, TlasBuildInput, TlasBuildMode, TlasInstance, TriangleGeometry,
};

/// GPU resources backing one BLAS
#[derive(Debug, Clone, PartialEq)]
pub struct BlasAssetRecord {
    /// The bottom-level structure
    pub blas: AccelerationStructureHandle,
    /// Device address referenced by instance records
    pub device_address: u64,
    /// Vertex positions
    pub vertex_buffer: BufferHandle,
    /// Triangle indices
    pub index_buffer: BufferHandle,
    /// Object-space bounds of the geometry
    pub bounds: Aabb,
    /// Triangle count
    pub triangle_count: usize,
}

/// Whether the ray-tracing path is usable
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RayTracingStatus {
    /// Nothing created yet, or destroyed
    #[default]
    Uninitialized,
    /// Structures exist and the TLAS is current
    Ready,
    /// Turned off for the rest of the session
    Disabled {
        /// Why it was turned off
        reason: String,
    },
}

/// Build counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccelerationStructureStats {
    /// BLAS builds issued
    pub blas_builds: usize,
    /// Full TLAS builds issued
    pub tlas_builds: usize,
    /// TLAS updates issued
    pub tlas_updates: usize,
    /// Instances in the current TLAS
    pub instance_count: usize,
    /// Instances dropped by the capacity limit in the last enumeration
    pub skipped_instances: usize,
}

/// A buffer that is re-created larger when needed and never shrinks
#[derive(Debug)]
struct GrowableBuffer {
    usage: BufferUsage,
    handle: Option<BufferHandle>,
    capacity: u64,
}

impl GrowableBuffer {
    fn new(usage: BufferUsage) -> Self {
        Self {
            usage,
            handle: None,
            capacity: 0,
        }
    }

    fn ensure(&mut self, backend: &mut dyn AccelerationStructureBackend, required: u64) -> BackendResult<BufferHandle> {
        if let Some(handle) = self.handle {
            if self.capacity >= required {
                return Ok(handle);
            }
        }

        let capacity = required.max(1).next_power_of_two();
        let handle = backend.create_buffer(capacity, self.usage)?;
        if let Some(old) = self.handle.replace(handle) {
            backend.destroy_buffer(old);
        }
        log::trace!("Grew {:?} buffer {} -> {} bytes", self.usage, self.capacity, capacity);
        self.capacity = capacity;
        Ok(handle)
    }

    fn release(&mut self, backend: &mut dyn AccelerationStructureBackend) {
        if let Some(handle) = self.handle.take() {
            backend.destroy_buffer(handle);
        }
        self.capacity = 0;
    }
}

/// Resources created so far by a BLAS build, released if it fails midway
#[derive(Default)]
struct PartialBlas {
    vertex_buffer: Option<BufferHandle>,
    index_buffer: Option<BufferHandle>,
    blas: Option<AccelerationStructureHandle>,
}

impl PartialBlas {
    fn release(self, backend: &mut dyn AccelerationStructureBackend) {
        if let Some(blas) = self.blas {
            backend.destroy_acceleration_structure(blas);
        }
        for buffer in [self.vertex_buffer, self.index_buffer].into_iter().flatten() {
            backend.destroy_buffer(buffer);
        }
    }
}

/// Owner of every BLAS, the TLAS and their buffers
#[derive(Debug)]
pub struct AccelerationStructureManager {
    config: RayTracingConfig,
    status: RayTracingStatus,
    cube: Option<BlasAssetRecord>,
    plane: Option<BlasAssetRecord>,
    assets: HashMap<String, BlasAssetRecord>,
    failed_assets: HashSet<String>,
    tlas: Option<AccelerationStructureHandle>,
    scratch: GrowableBuffer,
    instances: GrowableBuffer,
    last_topology: Option<Vec<AccelerationStructureHandle>>,
    stats: AccelerationStructureStats,
}

impl AccelerationStructureManager {
    /// Create a manager; nothing is allocated until
    /// [`Self::create_ray_tracing_as`]
    pub fn new(config: RayTracingConfig) -> Self {
        Self {
            config,
            status: RayTracingStatus::Uninitialized,
            cube: None,
            plane: None,
            assets: HashMap::new(),
            failed_assets: HashSet::new(),
            tlas: None,
            scratch: GrowableBuffer::new(BufferUsage::SCRATCH | BufferUsage::DEVICE_ADDRESS),
            instances: GrowableBuffer::new(
                BufferUsage::INSTANCES | BufferUsage::BUILD_INPUT | BufferUsage::DEVICE_ADDRESS,
            ),
            last_topology: None,
            stats: AccelerationStructureStats::default(),
        }
    }

    /// Current status
    pub fn status(&self) -> &RayTracingStatus {
        &self.status
    }

    /// Whether structures exist and can be traced
    pub fn is_ready(&self) -> bool {
        self.status == RayTracingStatus::Ready
    }

    /// Build counters
    pub fn stats(&self) -> AccelerationStructureStats {
        self.stats
    }

    /// Current TLAS, for render dispatch
    pub fn tlas(&self) -> Option<AccelerationStructureHandle> {
        if self.is_ready() {
            self.tlas
        } else {
            None
        }
    }

    /// BLAS record for a dynamic asset, if built
    pub fn blas_for(&self, asset_id: &str) -> Option<&BlasAssetRecord> {
        self.assets.get(asset_id)
    }

    /// Capacity of the instance buffer in bytes
    pub fn instance_buffer_capacity(&self) -> u64 {
        self.instances.capacity
    }

    /// Capacity of the scratch buffer in bytes
    pub fn scratch_buffer_capacity(&self) -> u64 {
        self.scratch.capacity
    }

    /// One-time construction: cube and plane BLAS, a TLAS sized for the
    /// configured capacity, then the first full build.
    ///
    /// Returns whether ray tracing is ready. Failures disable the feature
    /// instead of propagating.
    pub fn create_ray_tracing_as(
        &mut self,
        world: &World,
        assets: &mut MeshAssetCache,
        source: &dyn MeshAssetSource,
        backend: &mut dyn AccelerationStructureBackend,
    ) -> bool {
        match self.status {
            RayTracingStatus::Ready => return true,
            RayTracingStatus::Disabled { .. } => return false,
            RayTracingStatus::Uninitialized => {}
        }

        if !self.config.enabled {
            self.disable("disabled in configuration".to_string(), backend);
            return false;
        }

        if let Err(err) = self.create_static_structures(backend) {
            self.disable(format!("acceleration structure creation failed: {}", err), backend);
            return false;
        }

        self.status = RayTracingStatus::Ready;
        log::info!(
            "Ray tracing structures created (TLAS capacity {} instances)",
            self.config.max_instances
        );

        self.update_tlas(world, assets, source, backend).is_some()
    }

    fn create_static_structures(&mut self, backend: &mut dyn AccelerationStructureBackend) -> BackendResult<()> {
        self.cube = Some(self.build_blas(&MeshData::cube(), backend)?);
        self.plane = Some(self.build_blas(&MeshData::plane(), backend)?);

        let sizes = backend.tlas_sizes(self.config.max_instances);
        self.tlas = Some(backend.create_acceleration_structure(
            AccelerationStructureType::TopLevel,
            sizes.acceleration_structure_size,
        )?);
        Ok(())
    }

    /// BLAS for a dynamic asset, building it on first request.
    ///
    /// Idempotent: later calls return the cached handle without loading or
    /// building again. An unresolvable asset yields `None` (logged once by
    /// the asset cache); a device failure disables ray tracing.
    pub fn ensure_gltf_blas(
        &mut self,
        asset_id: &str,
        assets: &mut MeshAssetCache,
        source: &dyn MeshAssetSource,
        backend: &mut dyn AccelerationStructureBackend,
    ) -> Option<AccelerationStructureHandle> {
        if !self.is_ready() {
            return None;
        }
        if let Some(record) = self.assets.get(asset_id) {
            return Some(record.blas);
        }
        if self.failed_assets.contains(asset_id) {
            return None;
        }

        let Some(mesh) = assets.resolve(asset_id, source) else {
            self.failed_assets.insert(asset_id.to_string());
            return None;
        };

        match self.build_blas(mesh, backend) {
            Ok(record) => {
                log::debug!("Built BLAS for '{}' ({} triangles)", asset_id, record.triangle_count);
                let blas = record.blas;
                self.assets.insert(asset_id.to_string(), record);
                Some(blas)
            }
            Err(err) => {
                self.disable(format!("BLAS build for '{}' failed: {}", asset_id, err), backend);
                None
            }
        }
    }

    /// Rebuild or refit the TLAS from the current transforms.
    ///
    /// Instances are the ground plane first, then static primitives, then
    /// dynamic assets with a built BLAS, each group in creation order and
    /// the whole list capped at the configured capacity. A refit is issued
    /// only when the instance list binds exactly the same BLAS sequence as
    /// the previous build; any added, removed or re-meshed entity forces a
    /// full build.
    pub fn update_tlas(
        &mut self,
        world: &World,
        assets: &mut MeshAssetCache,
        source: &dyn MeshAssetSource,
        backend: &mut dyn AccelerationStructureBackend,
    ) -> Option<TlasBuildMode> {
        if !self.is_ready() {
            return None;
        }

        let (instances, topology) = self.collect_instances(world, assets, source, backend)?;

        match self.submit_tlas(&instances, &topology, backend) {
            Ok(mode) => {
                match mode {
                    TlasBuildMode::Build => self.stats.tlas_builds += 1,
                    TlasBuildMode::Update => self.stats.tlas_updates += 1,
                }
                self.stats.instance_count = instances.len();
                self.last_topology = Some(topology);
                log::trace!("TLAS {:?} with {} instances", mode, instances.len());
                Some(mode)
            }
            Err(err) => {
                self.disable(format!("TLAS build failed: {}", err), backend);
                None
            }
        }
    }

    fn collect_instances(
        &mut self,
        world: &World,
        assets: &mut MeshAssetCache,
        source: &dyn MeshAssetSource,
        backend: &mut dyn AccelerationStructureBackend,
    ) -> Option<(Vec<TlasInstance>, Vec<AccelerationStructureHandle>)> {
        let cube = self.cube.as_ref()?;
        let plane = self.plane.as_ref()?;
        let (cube_blas, cube_address) = (cube.blas, cube.device_address);
        let (plane_blas, plane_address) = (plane.blas, plane.device_address);

        let capacity = self.config.max_instances as usize;
        let mut instances = Vec::with_capacity(capacity.min(world.entity_count() + 1));
        let mut topology = Vec::with_capacity(instances.capacity());

        let ground = &self.config.ground_plane;
        let ground_matrix = Mat4::new_translation(&Vec3::new(0.0, ground.height, 0.0))
            * Mat4::new_nonuniform_scaling(&Vec3::new(ground.half_extent, 1.0, ground.half_extent));
        instances.push(TlasInstance::new(
            &ground_matrix,
            0,
            0xFF,
            InstanceFlags::TRIANGLE_CULL_DISABLE,
            plane_address,
        ));
        topology.push(plane_blas);

        // Static primitives before dynamic assets, each in creation order
        let mut entities: Vec<((bool, u64), Mat4, MeshComponent)> = world
            .query2::<TransformComponent, MeshComponent>()
            .map(|(entity, transform, mesh)| {
                let order = world.creation_index(entity).unwrap_or(u64::MAX);
                let dynamic = matches!(mesh, MeshComponent::Dynamic { .. });
                ((dynamic, order), transform.world_matrix(), mesh.clone())
            })
            .collect();
        entities.sort_by_key(|(key, _, _)| *key);

        let mut skipped = 0;
        for (_, matrix, mesh) in entities {
            if instances.len() >= capacity {
                skipped += 1;
                continue;
            }

            let (blas, address) = match &mesh {
                MeshComponent::Static(PrimitiveMesh::Cube) => (cube_blas, cube_address),
                MeshComponent::Static(PrimitiveMesh::Plane) => (plane_blas, plane_address),
                MeshComponent::Dynamic { asset_id } => {
                    let Some(blas) = self.ensure_gltf_blas(asset_id, assets, source, backend) else {
                        if !self.is_ready() {
                            return None;
                        }
                        continue;
                    };
                    let address = self.assets.get(asset_id.as_str()).map_or(0, |record| record.device_address);
                    (blas, address)
                }
            };

            let custom_index = instances.len() as u32;
            instances.push(TlasInstance::new(
                &matrix,
                custom_index,
                0xFF,
                InstanceFlags::TRIANGLE_CULL_DISABLE,
                address,
            ));
            topology.push(blas);
        }

        if skipped > 0 {
            log::debug!("TLAS capacity {} reached, {} instances skipped", capacity, skipped);
        }
        self.stats.skipped_instances = skipped;

        Some((instances, topology))
    }

    fn submit_tlas(
        &mut self,
        instances: &[TlasInstance],
        topology: &[AccelerationStructureHandle],
        backend: &mut dyn AccelerationStructureBackend,
    ) -> BackendResult<TlasBuildMode> {
        let tlas = self
            .tlas
            .ok_or_else(|| BackendError::Api("TLAS not created".to_string()))?;

        let mode = if self.last_topology.as_deref() == Some(topology) {
            TlasBuildMode::Update
        } else {
            TlasBuildMode::Build
        };

        let count = instances.len() as u32;
        let sizes = backend.tlas_sizes(count);
        let scratch_size = match mode {
            TlasBuildMode::Build => sizes.build_scratch_size,
            TlasBuildMode::Update => sizes.update_scratch_size,
        };
        let scratch_buffer = self.scratch.ensure(backend, scratch_size)?;

        let bytes: &[u8] = bytemuck::cast_slice(instances);
        let instance_buffer = self.instances.ensure(backend, bytes.len() as u64)?;
        backend.write_buffer(instance_buffer, 0, bytes)?;

        backend.build_tlas(&TlasBuildInput {
            src: (mode == TlasBuildMode::Update).then_some(tlas),
            dst: tlas,
            mode,
            scratch_buffer,
            instance_buffer,
            instance_count: count,
        })?;
        Ok(mode)
    }

    fn build_blas(
        &mut self,
        mesh: &MeshData,
        backend: &mut dyn AccelerationStructureBackend,
    ) -> BackendResult<BlasAssetRecord> {
        let mut partial = PartialBlas::default();
        match self.try_build_blas(mesh, backend, &mut partial) {
            Ok(record) => Ok(record),
            Err(err) => {
                partial.release(backend);
                Err(err)
            }
        }
    }

    fn try_build_blas(
        &mut self,
        mesh: &MeshData,
        backend: &mut dyn AccelerationStructureBackend,
        partial: &mut PartialBlas,
    ) -> BackendResult<BlasAssetRecord> {
        let input_usage = BufferUsage::BUILD_INPUT | BufferUsage::DEVICE_ADDRESS;

        let positions = mesh.position_array();
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&positions);
        let vertex_buffer = backend.create_buffer(vertex_bytes.len() as u64, BufferUsage::VERTEX | input_usage)?;
        partial.vertex_buffer = Some(vertex_buffer);
        backend.write_buffer(vertex_buffer, 0, vertex_bytes)?;

        let index_bytes: &[u8] = bytemuck::cast_slice(&mesh.indices);
        let index_buffer = backend.create_buffer(index_bytes.len() as u64, BufferUsage::INDEX | input_usage)?;
        partial.index_buffer = Some(index_buffer);
        backend.write_buffer(index_buffer, 0, index_bytes)?;

        let geometry = TriangleGeometry {
            vertex_buffer,
            vertex_count: positions.len() as u32,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        };
        let sizes = backend.blas_sizes(&geometry);
        let blas = backend.create_acceleration_structure(
            AccelerationStructureType::BottomLevel,
            sizes.acceleration_structure_size,
        )?;
        partial.blas = Some(blas);

        let scratch_buffer = self.scratch.ensure(backend, sizes.build_scratch_size)?;
        backend.build_blas(&BlasBuildInput {
            dst: blas,
            scratch_buffer,
            geometry,
        })?;
        let device_address = backend.acceleration_structure_address(blas)?;

        self.stats.blas_builds += 1;
        Ok(BlasAssetRecord {
            blas,
            device_address,
            vertex_buffer,
            index_buffer,
            bounds: mesh.bounds,
            triangle_count: mesh.triangle_count(),
        })
    }

    /// Release every BLAS, the TLAS and all buffers. Safe to call when
    /// nothing was created.
    pub fn destroy_ray_tracing_as(&mut self, backend: &mut dyn AccelerationStructureBackend) {
        let had_resources = self.tlas.is_some() || self.cube.is_some() || !self.assets.is_empty();
        self.release_resources(backend);
        if self.status == RayTracingStatus::Ready {
            self.status = RayTracingStatus::Uninitialized;
        }
        if had_resources {
            log::info!("Ray tracing structures destroyed");
        }
    }

    fn release_resources(&mut self, backend: &mut dyn AccelerationStructureBackend) {
        let records = self
            .cube
            .take()
            .into_iter()
            .chain(self.plane.take())
            .chain(self.assets.drain().map(|(_, record)| record));
        for record in records {
            backend.destroy_acceleration_structure(record.blas);
            backend.destroy_buffer(record.vertex_buffer);
            backend.destroy_buffer(record.index_buffer);
        }

        if let Some(tlas) = self.tlas.take() {
            backend.destroy_acceleration_structure(tlas);
        }
        self.scratch.release(backend);
        self.instances.release(backend);
        self.failed_assets.clear();
        self.last_topology = None;
        self.stats.instance_count = 0;
    }

    fn disable(&mut self, reason: String, backend: &mut dyn AccelerationStructureBackend) {
        log::error!("Ray tracing disabled: {}", reason);
        self.release_resources(backend);
        self.status = RayTracingStatus::Disabled { reason };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetError;
    use crate::ecs::Entity;
    use crate::raytracing::HeadlessBackend;
    use std::cell::Cell;

    struct CountingSource {
        loads: Cell<usize>,
    }

    impl MeshAssetSource for CountingSource {
        fn load(&self, asset_id: &str) -> Result<MeshData, AssetError> {
            self.loads.set(self.loads.get() + 1);
            match asset_id {
                "model.obj" => Ok(MeshData::cube()),
                _ => Err(AssetError::NotFound(asset_id.to_string())),
            }
        }
    }

    struct Fixture {
        world: World,
        assets: MeshAssetCache,
        source: CountingSource,
        backend: HeadlessBackend,
        manager: AccelerationStructureManager,
    }

    impl Fixture {
        fn new(config: RayTracingConfig, backend: HeadlessBackend) -> Self {
            Self {
                world: World::new(),
                assets: MeshAssetCache::new(),
                source: CountingSource { loads: Cell::new(0) },
                backend,
                manager: AccelerationStructureManager::new(config),
            }
        }

        fn spawn(&mut self, name: &str, position: Vec3, mesh: MeshComponent) -> Entity {
            let entity = self.world.create_object(name).unwrap();
            self.world.add_component(entity, TransformComponent::from_position(position)).unwrap();
            self.world.add_component(entity, mesh).unwrap();
            entity
        }

        fn create(&mut self) -> bool {
            self.manager
                .create_ray_tracing_as(&self.world, &mut self.assets, &self.source, &mut self.backend)
        }

        fn update(&mut self) -> Option<TlasBuildMode> {
            self.manager
                .update_tlas(&self.world, &mut self.assets, &self.source, &mut self.backend)
        }
    }

    fn fixture() -> Fixture {
        Fixture::new(RayTracingConfig::default(), HeadlessBackend::new())
    }

    #[test]
    fn test_create_builds_static_blas_and_tlas() {
        let mut f = fixture();
        f.spawn("Cube", Vec3::zeros(), MeshComponent::cube());

        assert!(f.create());
        assert!(f.manager.is_ready());
        assert!(f.manager.tlas().is_some());

        let stats = f.manager.stats();
        assert_eq!(stats.blas_builds, 2);
        assert_eq!(stats.tlas_builds, 1);
        assert_eq!(stats.instance_count, 2);

        // Second create is a no-op
        assert!(f.create());
        assert_eq!(f.manager.stats().blas_builds, 2);
    }

    #[test]
    fn test_ground_plane_is_first_instance_then_creation_order() {
        let mut f = fixture();
        f.spawn("A", Vec3::new(1.0, 0.0, 0.0), MeshComponent::cube());
        f.spawn("B", Vec3::new(2.0, 0.0, 0.0), MeshComponent::plane());
        assert!(f.create());

        let instances = f.backend.last_instances();
        assert_eq!(instances.len(), 3);
        assert_eq!(instances[0].translation(), [0.0, 0.0, 0.0]);
        assert_eq!(instances[1].translation(), [1.0, 0.0, 0.0]);
        assert_eq!(instances[2].translation(), [2.0, 0.0, 0.0]);
        assert_eq!(instances[2].custom_index(), 2);
        assert_eq!(instances[0].blas_address, instances[2].blas_address);
    }

    #[test]
    fn test_static_instances_precede_dynamic_ones() {
        let mut f = fixture();
        f.spawn("Model", Vec3::new(5.0, 0.0, 0.0), MeshComponent::dynamic("model.obj"));
        f.spawn("Cube", Vec3::new(1.0, 0.0, 0.0), MeshComponent::cube());
        assert!(f.create());

        let instances = f.backend.last_instances();
        assert_eq!(instances.len(), 3);
        assert_eq!(instances[1].translation(), [1.0, 0.0, 0.0]);
        assert_eq!(instances[2].translation(), [5.0, 0.0, 0.0]);
        let model_address = f.manager.blas_for("model.obj").unwrap().device_address;
        assert_eq!(instances[2].blas_address, model_address);
    }

    #[test]
    fn test_topology_decides_build_or_update() {
        let mut f = fixture();
        let cube = f.spawn("Cube", Vec3::zeros(), MeshComponent::cube());
        assert!(f.create());

        // Moving an entity keeps the BLAS sequence: refit
        f.world.get_component_mut::<TransformComponent>(cube).unwrap().position = Vec3::new(3.0, 0.0, 0.0);
        assert_eq!(f.update(), Some(TlasBuildMode::Update));
        assert_eq!(f.backend.last_instances()[1].translation(), [3.0, 0.0, 0.0]);

        // Adding an entity changes the instance count
        let other = f.spawn("Other", Vec3::zeros(), MeshComponent::cube());
        assert_eq!(f.update(), Some(TlasBuildMode::Build));
        assert_eq!(f.update(), Some(TlasBuildMode::Update));

        // Same count, different BLAS
        f.world.add_component(other, MeshComponent::plane()).unwrap();
        assert_eq!(f.update(), Some(TlasBuildMode::Build));

        // Removing an entity
        f.world.destroy_entity(other);
        assert_eq!(f.update(), Some(TlasBuildMode::Build));

        let stats = f.manager.stats();
        assert_eq!(stats.tlas_builds, 4);
        assert_eq!(stats.tlas_updates, 2);
        assert_eq!(f.backend.stats().tlas_updates, 2);
    }

    #[test]
    fn test_dynamic_asset_loaded_and_built_once() {
        let mut f = fixture();
        f.spawn("Model A", Vec3::zeros(), MeshComponent::dynamic("model.obj"));
        f.spawn("Model B", Vec3::new(4.0, 0.0, 0.0), MeshComponent::dynamic("model.obj"));
        assert!(f.create());

        for _ in 0..3 {
            assert!(f.update().is_some());
        }

        assert_eq!(f.source.loads.get(), 1);
        assert_eq!(f.manager.stats().blas_builds, 3);
        assert_eq!(f.manager.stats().instance_count, 3);

        let record = f.manager.blas_for("model.obj").unwrap();
        assert_eq!(record.triangle_count, 12);
        let blas = record.blas;
        let again = f
            .manager
            .ensure_gltf_blas("model.obj", &mut f.assets, &f.source, &mut f.backend);
        assert_eq!(again, Some(blas));
        assert_eq!(f.source.loads.get(), 1);
    }

    #[test]
    fn test_missing_asset_is_skipped_without_disabling() {
        let mut f = fixture();
        f.spawn("Cube", Vec3::zeros(), MeshComponent::cube());
        f.spawn("Ghost", Vec3::zeros(), MeshComponent::dynamic("missing.obj"));
        assert!(f.create());
        assert_eq!(f.update(), Some(TlasBuildMode::Update));

        assert!(f.manager.is_ready());
        assert_eq!(f.manager.stats().instance_count, 2);
        assert_eq!(f.source.loads.get(), 1);
    }

    #[test]
    fn test_out_of_memory_at_creation_disables() {
        crate::foundation::logging::init_for_tests();
        let mut f = Fixture::new(RayTracingConfig::default(), HeadlessBackend::with_memory_budget(2048));
        f.spawn("Cube", Vec3::zeros(), MeshComponent::cube());

        assert!(!f.create());
        assert!(matches!(f.manager.status(), RayTracingStatus::Disabled { .. }));
        assert!(f.manager.tlas().is_none());
        assert_eq!(f.backend.live_buffers(), 0);
        assert_eq!(f.backend.live_structures(), 0);

        // Stays off
        assert!(f.update().is_none());
        assert!(!f.create());
    }

    #[test]
    fn test_out_of_memory_during_update_disables() {
        crate::foundation::logging::init_for_tests();
        let mut f = fixture();
        f.spawn("Cube", Vec3::zeros(), MeshComponent::cube());
        assert!(f.create());

        f.backend.set_memory_budget(Some(f.backend.allocated_bytes()));
        for i in 0..8 {
            f.spawn(&format!("Extra {}", i), Vec3::zeros(), MeshComponent::cube());
        }

        assert!(f.update().is_none());
        match f.manager.status() {
            RayTracingStatus::Disabled { reason } => assert!(reason.contains("Out of device memory")),
            other => panic!("expected disabled, got {:?}", other),
        }
        assert_eq!(f.backend.allocated_bytes(), 0);
    }

    #[test]
    fn test_buffers_never_shrink() {
        let mut f = fixture();
        let entities: Vec<Entity> = (0..20)
            .map(|i| f.spawn(&format!("Cube {}", i), Vec3::new(i as f32, 0.0, 0.0), MeshComponent::cube()))
            .collect();
        assert!(f.create());

        let instance_capacity = f.manager.instance_buffer_capacity();
        let scratch_capacity = f.manager.scratch_buffer_capacity();
        assert!(instance_capacity >= 21 * TlasInstance::SIZE);
        assert!(instance_capacity.is_power_of_two());

        for entity in &entities[1..] {
            f.world.destroy_entity(*entity);
        }
        assert_eq!(f.update(), Some(TlasBuildMode::Build));
        assert_eq!(f.manager.instance_buffer_capacity(), instance_capacity);
        assert_eq!(f.manager.scratch_buffer_capacity(), scratch_capacity);
    }

    #[test]
    fn test_instance_capacity_is_enforced() {
        let config = RayTracingConfig {
            max_instances: 3,
            ..RayTracingConfig::default()
        };
        let mut f = Fixture::new(config, HeadlessBackend::new());
        for i in 0..5 {
            f.spawn(&format!("Cube {}", i), Vec3::new(i as f32, 0.0, 0.0), MeshComponent::cube());
        }
        assert!(f.create());

        let stats = f.manager.stats();
        assert_eq!(stats.instance_count, 3);
        assert_eq!(stats.skipped_instances, 3);
        assert_eq!(f.backend.last_instances()[2].translation(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_disabled_in_config_allocates_nothing() {
        let config = RayTracingConfig {
            enabled: false,
            ..RayTracingConfig::default()
        };
        let mut f = Fixture::new(config, HeadlessBackend::new());

        assert!(!f.create());
        assert!(matches!(f.manager.status(), RayTracingStatus::Disabled { .. }));
        assert_eq!(f.backend.stats().buffers_created, 0);
    }

    #[test]
    fn test_destroy_releases_everything() {
        let mut f = fixture();
        f.manager.destroy_ray_tracing_as(&mut f.backend);
        assert_eq!(f.manager.status(), &RayTracingStatus::Uninitialized);

        f.spawn("Model", Vec3::zeros(), MeshComponent::dynamic("model.obj"));
        assert!(f.create());
        assert!(f.backend.live_structures() > 0);

        f.manager.destroy_ray_tracing_as(&mut f.backend);
        assert_eq!(f.manager.status(), &RayTracingStatus::Uninitialized);
        assert_eq!(f.backend.live_buffers(), 0);
        assert_eq!(f.backend.live_structures(), 0);
        assert!(f.manager.blas_for("model.obj").is_none());

        // Can be brought back up
        assert!(f.create());
        assert_eq!(f.manager.stats().instance_count, 2);
    }
}

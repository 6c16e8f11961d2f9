//! CPU-only backend
//!
//! Tracks allocations and builds without a device. An optional memory
//! budget makes allocation failures reproducible, and TLAS builds validate
//! their inputs the way a driver's validation layer would.

use std::collections::HashMap;

use super::backend::{AccelerationStructureBackend, BackendError, BackendResult};
use super::types::{
    AccelerationStructureHandle, AccelerationStructureSizes, AccelerationStructureType, BlasBuildInput,
    BufferHandle, BufferUsage, TlasBuildInput, TlasBuildMode, TlasInstance, TriangleGeometry,
};

#[derive(Debug)]
struct HeadlessBuffer {
    usage: BufferUsage,
    data: Vec<u8>,
}

#[derive(Debug)]
struct HeadlessStructure {
    kind: AccelerationStructureType,
    size: u64,
    built_instances: Option<u32>,
}

/// Operation counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeadlessStats {
    /// Buffers created
    pub buffers_created: usize,
    /// Acceleration structures created
    pub structures_created: usize,
    /// BLAS builds recorded
    pub blas_builds: usize,
    /// Full TLAS builds recorded
    pub tlas_builds: usize,
    /// TLAS updates recorded
    pub tlas_updates: usize,
}

/// Bookkeeping backend for tests and headless runs
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    buffers: HashMap<BufferHandle, HeadlessBuffer>,
    structures: HashMap<AccelerationStructureHandle, HeadlessStructure>,
    memory_budget: Option<u64>,
    allocated: u64,
    stats: HeadlessStats,
    last_instances: Vec<TlasInstance>,
}

impl HeadlessBackend {
    /// Create a backend with unlimited memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that fails allocations beyond `bytes`
    pub fn with_memory_budget(bytes: u64) -> Self {
        Self {
            memory_budget: Some(bytes),
            ..Self::default()
        }
    }

    /// Change the budget; allocations already made are kept
    pub fn set_memory_budget(&mut self, bytes: Option<u64>) {
        self.memory_budget = bytes;
    }

    /// Operation counters
    pub fn stats(&self) -> HeadlessStats {
        self.stats
    }

    /// Bytes currently allocated
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated
    }

    /// Live buffer count
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Live acceleration structure count
    pub fn live_structures(&self) -> usize {
        self.structures.len()
    }

    /// Size of a live buffer
    pub fn buffer_size(&self, buffer: BufferHandle) -> Option<u64> {
        self.buffers.get(&buffer).map(|b| b.data.len() as u64)
    }

    /// Usage of a live buffer
    pub fn buffer_usage(&self, buffer: BufferHandle) -> Option<BufferUsage> {
        self.buffers.get(&buffer).map(|b| b.usage)
    }

    /// Instances consumed by the most recent TLAS build or update
    pub fn last_instances(&self) -> &[TlasInstance] {
        &self.last_instances
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn reserve(&mut self, size: u64) -> BackendResult<()> {
        if let Some(budget) = self.memory_budget {
            let available = budget.saturating_sub(self.allocated);
            if size > available {
                return Err(BackendError::OutOfMemory {
                    requested: size,
                    available,
                });
            }
        }
        self.allocated += size;
        Ok(())
    }

    fn structure(&self, handle: AccelerationStructureHandle) -> BackendResult<&HeadlessStructure> {
        self.structures.get(&handle).ok_or(BackendError::InvalidHandle(handle.0))
    }

    fn buffer(&self, buffer: BufferHandle) -> BackendResult<&HeadlessBuffer> {
        self.buffers.get(&buffer).ok_or(BackendError::InvalidHandle(buffer.0))
    }
}

impl AccelerationStructureBackend for HeadlessBackend {
    fn create_buffer(&mut self, size: u64, usage: BufferUsage) -> BackendResult<BufferHandle> {
        self.reserve(size)?;
        let handle = BufferHandle(self.next_id());
        self.buffers.insert(
            handle,
            HeadlessBuffer {
                usage,
                data: vec![0; size as usize],
            },
        );
        self.stats.buffers_created += 1;
        Ok(handle)
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) -> BackendResult<()> {
        let target = self.buffers.get_mut(&buffer).ok_or(BackendError::InvalidHandle(buffer.0))?;
        let start = offset as usize;
        let end = start + data.len();
        if end > target.data.len() {
            return Err(BackendError::Api(format!(
                "Write of {} bytes at {} overflows buffer of {} bytes",
                data.len(),
                offset,
                target.data.len()
            )));
        }
        target.data[start..end].copy_from_slice(data);
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if let Some(removed) = self.buffers.remove(&buffer) {
            self.allocated -= removed.data.len() as u64;
        }
    }

    fn blas_sizes(&self, geometry: &TriangleGeometry) -> AccelerationStructureSizes {
        let triangles = u64::from(geometry.index_count / 3);
        let vertices = u64::from(geometry.vertex_count);
        let scratch = (triangles * 128).max(1024);
        AccelerationStructureSizes {
            acceleration_structure_size: (triangles * 64 + vertices * 16).max(1024),
            build_scratch_size: scratch,
            update_scratch_size: scratch / 2,
        }
    }

    fn tlas_sizes(&self, instance_count: u32) -> AccelerationStructureSizes {
        let instances = u64::from(instance_count);
        AccelerationStructureSizes {
            acceleration_structure_size: instances * 128 + 1024,
            build_scratch_size: instances * 64 + 1024,
            update_scratch_size: instances * 32 + 512,
        }
    }

    fn create_acceleration_structure(
        &mut self,
        kind: AccelerationStructureType,
        size: u64,
    ) -> BackendResult<AccelerationStructureHandle> {
        self.reserve(size)?;
        let handle = AccelerationStructureHandle(self.next_id());
        self.structures.insert(
            handle,
            HeadlessStructure {
                kind,
                size,
                built_instances: None,
            },
        );
        self.stats.structures_created += 1;
        Ok(handle)
    }

    fn acceleration_structure_address(&self, handle: AccelerationStructureHandle) -> BackendResult<u64> {
        self.structure(handle)?;
        Ok(handle.0 << 16)
    }

    fn build_blas(&mut self, input: &BlasBuildInput) -> BackendResult<()> {
        if self.structure(input.dst)?.kind != AccelerationStructureType::BottomLevel {
            return Err(BackendError::Api("BLAS build targets a top-level structure".to_string()));
        }
        self.buffer(input.scratch_buffer)?;
        self.buffer(input.geometry.vertex_buffer)?;
        self.buffer(input.geometry.index_buffer)?;

        self.stats.blas_builds += 1;
        Ok(())
    }

    fn build_tlas(&mut self, input: &TlasBuildInput) -> BackendResult<()> {
        let structure = self.structure(input.dst)?;
        if structure.kind != AccelerationStructureType::TopLevel {
            return Err(BackendError::Api("TLAS build targets a bottom-level structure".to_string()));
        }

        let required = self.tlas_sizes(input.instance_count);
        if required.acceleration_structure_size > structure.size {
            return Err(BackendError::Api(format!(
                "TLAS of {} bytes too small for {} instances",
                structure.size, input.instance_count
            )));
        }

        if input.mode == TlasBuildMode::Update {
            if input.src != Some(input.dst) {
                return Err(BackendError::Api("TLAS update must refit in place".to_string()));
            }
            if structure.built_instances != Some(input.instance_count) {
                return Err(BackendError::Api("TLAS update with changed instance count".to_string()));
            }
        }

        let scratch_needed = match input.mode {
            TlasBuildMode::Build => required.build_scratch_size,
            TlasBuildMode::Update => required.update_scratch_size,
        };
        if (self.buffer(input.scratch_buffer)?.data.len() as u64) < scratch_needed {
            return Err(BackendError::Api("Scratch buffer too small".to_string()));
        }

        let instance_bytes = (u64::from(input.instance_count) * TlasInstance::SIZE) as usize;
        let data = &self.buffer(input.instance_buffer)?.data;
        if data.len() < instance_bytes {
            return Err(BackendError::Api("Instance buffer too small".to_string()));
        }
        let instances = data[..instance_bytes]
            .chunks_exact(TlasInstance::SIZE as usize)
            .map(bytemuck::pod_read_unaligned::<TlasInstance>)
            .collect();
        self.last_instances = instances;

        if let Some(structure) = self.structures.get_mut(&input.dst) {
            structure.built_instances = Some(input.instance_count);
        }
        match input.mode {
            TlasBuildMode::Build => self.stats.tlas_builds += 1,
            TlasBuildMode::Update => self.stats.tlas_updates += 1,
        }
        Ok(())
    }

    fn destroy_acceleration_structure(&mut self, handle: AccelerationStructureHandle) {
        if let Some(removed) = self.structures.remove(&handle) {
            self.allocated -= removed.size;
        }
    }
}

//! GPU collaborator for acceleration structure management
//!
//! The manager only does bookkeeping; every allocation and build goes
//! through this trait so the same logic drives a real device or the
//! [`super::HeadlessBackend`].

use thiserror::Error;

use super::types::{
    AccelerationStructureHandle, AccelerationStructureSizes, AccelerationStructureType, BlasBuildInput,
    BufferHandle, BufferUsage, TlasBuildInput, TriangleGeometry,
};

/// GPU resource errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Allocation exceeded available device memory
    #[error("Out of device memory: requested {requested} bytes, {available} available")]
    OutOfMemory {
        /// Bytes requested
        requested: u64,
        /// Bytes still available
        available: u64,
    },

    /// A handle did not refer to a live resource
    #[error("Invalid resource handle {0}")]
    InvalidHandle(u64),

    /// Any other API failure
    #[error("Ray tracing API error: {0}")]
    Api(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Device operations needed to build and maintain acceleration structures
pub trait AccelerationStructureBackend {
    /// Allocate a buffer
    fn create_buffer(&mut self, size: u64, usage: BufferUsage) -> BackendResult<BufferHandle>;

    /// Upload bytes at `offset`
    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) -> BackendResult<()>;

    /// Release a buffer; unknown handles are ignored
    fn destroy_buffer(&mut self, buffer: BufferHandle);

    /// Sizes needed to build a BLAS over `geometry`
    fn blas_sizes(&self, geometry: &TriangleGeometry) -> AccelerationStructureSizes;

    /// Sizes needed for a TLAS holding `instance_count` instances
    fn tlas_sizes(&self, instance_count: u32) -> AccelerationStructureSizes;

    /// Allocate an acceleration structure of `size` bytes
    fn create_acceleration_structure(
        &mut self,
        kind: AccelerationStructureType,
        size: u64,
    ) -> BackendResult<AccelerationStructureHandle>;

    /// Device address used to reference a BLAS from instance records
    fn acceleration_structure_address(&self, handle: AccelerationStructureHandle) -> BackendResult<u64>;

    /// Record a BLAS build
    fn build_blas(&mut self, input: &BlasBuildInput) -> BackendResult<()>;

    /// Record a TLAS build or update
    fn build_tlas(&mut self, input: &TlasBuildInput) -> BackendResult<()>;

    /// Release an acceleration structure; unknown handles are ignored
    fn destroy_acceleration_structure(&mut self, handle: AccelerationStructureHandle);
}

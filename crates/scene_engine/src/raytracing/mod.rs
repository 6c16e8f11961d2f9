//! Hybrid ray-tracing support
//!
//! Acceleration structure bookkeeping for an optional ray-traced pass. The
//! rasterized path never depends on anything here: when a device call fails
//! the manager disables itself and reports [`RayTracingStatus::Disabled`].
//!
//! - [`AccelerationStructureManager`]: owns every BLAS, the TLAS and their
//!   buffers, and decides between full builds and refits
//! - [`AccelerationStructureBackend`]: the device seam
//! - [`HeadlessBackend`]: CPU bookkeeping implementation

pub mod types;
pub mod backend;
pub mod headless;
pub mod manager;

pub use types::{
    AccelerationStructureHandle, AccelerationStructureSizes, AccelerationStructureType, BlasBuildInput,
    BufferHandle, BufferUsage, InstanceFlags, TlasBuildInput, TlasBuildMode, TlasInstance, TriangleGeometry,
};
pub use backend::{AccelerationStructureBackend, BackendError, BackendResult};
pub use headless::{HeadlessBackend, HeadlessStats};
pub use manager::{AccelerationStructureManager, AccelerationStructureStats, BlasAssetRecord, RayTracingStatus};

//! Acceleration structure handles, flags and build descriptions

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Mat4;

/// Handle to a GPU buffer owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u64);

/// Handle to a BLAS or TLAS owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccelerationStructureHandle(pub u64);

/// Level of an acceleration structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccelerationStructureType {
    /// Bottom-level (geometry)
    BottomLevel,
    /// Top-level (instances)
    TopLevel,
}

bitflags! {
    /// How a buffer will be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Vertex positions
        const VERTEX = 1 << 0;
        /// Triangle indices
        const INDEX = 1 << 1;
        /// Build scratch memory
        const SCRATCH = 1 << 2;
        /// TLAS instance records
        const INSTANCES = 1 << 3;
        /// Readable by acceleration structure builds
        const BUILD_INPUT = 1 << 4;
        /// Needs a device address
        const DEVICE_ADDRESS = 1 << 5;
    }
}

bitflags! {
    /// Per-instance flags, packed into the top byte of the instance record
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InstanceFlags: u8 {
        /// Disable triangle culling
        const TRIANGLE_CULL_DISABLE = 1 << 0;
        /// Counter-clockwise triangles face front
        const TRIANGLE_FRONT_CCW = 1 << 1;
        /// Force opaque
        const FORCE_OPAQUE = 1 << 2;
        /// Force non-opaque
        const FORCE_NON_OPAQUE = 1 << 3;
    }
}

/// One TLAS instance in the conventional 64-byte hardware layout
///
/// `transform` is the top three rows of the row-major object-to-world
/// matrix. The custom index and the SBT offset occupy the low 24 bits of
/// their words, the mask and flags the high 8 bits.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TlasInstance {
    /// 3x4 row-major transform
    pub transform: [[f32; 4]; 3],
    /// Custom index (24 bits) | mask (8 bits)
    pub custom_index_and_mask: u32,
    /// SBT record offset (24 bits) | flags (8 bits)
    pub sbt_offset_and_flags: u32,
    /// Device address of the referenced BLAS
    pub blas_address: u64,
}

impl TlasInstance {
    /// Size of one record in bytes
    pub const SIZE: u64 = std::mem::size_of::<TlasInstance>() as u64;

    /// Build an instance record
    pub fn new(world_matrix: &Mat4, custom_index: u32, mask: u8, flags: InstanceFlags, blas_address: u64) -> Self {
        let mut transform = [[0.0; 4]; 3];
        for (row, values) in transform.iter_mut().enumerate() {
            for (column, value) in values.iter_mut().enumerate() {
                *value = world_matrix[(row, column)];
            }
        }

        Self {
            transform,
            custom_index_and_mask: (custom_index & 0x00FF_FFFF) | (u32::from(mask) << 24),
            sbt_offset_and_flags: u32::from(flags.bits()) << 24,
            blas_address,
        }
    }

    /// Custom index (low 24 bits)
    pub fn custom_index(&self) -> u32 {
        self.custom_index_and_mask & 0x00FF_FFFF
    }

    /// Visibility mask
    pub fn mask(&self) -> u8 {
        (self.custom_index_and_mask >> 24) as u8
    }

    /// Instance flags
    pub fn flags(&self) -> InstanceFlags {
        InstanceFlags::from_bits_truncate((self.sbt_offset_and_flags >> 24) as u8)
    }

    /// Translation column of the transform
    pub fn translation(&self) -> [f32; 3] {
        [self.transform[0][3], self.transform[1][3], self.transform[2][3]]
    }
}

/// Sizes reported by the backend for a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccelerationStructureSizes {
    /// Size of the acceleration structure itself
    pub acceleration_structure_size: u64,
    /// Scratch needed for a full build
    pub build_scratch_size: u64,
    /// Scratch needed for an in-place update
    pub update_scratch_size: u64,
}

/// TLAS build mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlasBuildMode {
    /// Full rebuild
    Build,
    /// In-place refit, valid only when the instance topology is unchanged
    Update,
}

/// Indexed triangle geometry already uploaded to GPU buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleGeometry {
    /// `[f32; 3]` positions
    pub vertex_buffer: BufferHandle,
    /// Number of vertices
    pub vertex_count: u32,
    /// `u32` indices
    pub index_buffer: BufferHandle,
    /// Number of indices
    pub index_count: u32,
}

/// Inputs for a BLAS build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlasBuildInput {
    /// Destination structure
    pub dst: AccelerationStructureHandle,
    /// Scratch buffer
    pub scratch_buffer: BufferHandle,
    /// Source geometry
    pub geometry: TriangleGeometry,
}

/// Inputs for a TLAS build or update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlasBuildInput {
    /// Source structure for updates
    pub src: Option<AccelerationStructureHandle>,
    /// Destination structure
    pub dst: AccelerationStructureHandle,
    /// Build or update
    pub mode: TlasBuildMode,
    /// Scratch buffer
    pub scratch_buffer: BufferHandle,
    /// Buffer of [`TlasInstance`] records
    pub instance_buffer: BufferHandle,
    /// Number of records in the instance buffer
    pub instance_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_instance_layout_is_64_bytes() {
        assert_eq!(TlasInstance::SIZE, 64);
        assert_eq!(std::mem::align_of::<TlasInstance>(), 8);
    }

    #[test]
    fn test_instance_packing() {
        let matrix = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let instance = TlasInstance::new(&matrix, 0x0123_4567, 0xAB, InstanceFlags::FORCE_OPAQUE, 42);

        assert_eq!(instance.custom_index(), 0x23_4567);
        assert_eq!(instance.mask(), 0xAB);
        assert_eq!(instance.flags(), InstanceFlags::FORCE_OPAQUE);
        assert_eq!(instance.translation(), [1.0, 2.0, 3.0]);
        assert_eq!(instance.transform[0][0], 1.0);

        let bytes = bytemuck::bytes_of(&instance);
        assert_eq!(bytes.len(), 64);
        assert_eq!(bytemuck::pod_read_unaligned::<TlasInstance>(bytes), instance);
    }
}

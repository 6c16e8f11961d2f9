//! Dynamic mesh assets
//!
//! Dynamic mesh components name an asset id. A [`MeshAssetSource`] turns the
//! id into geometry and the [`MeshAssetCache`] makes sure that happens at most
//! once per id, successful or not.

pub mod obj_loader;
pub mod cache;

pub use obj_loader::{ObjAssetSource, ObjLoader};
pub use cache::MeshAssetCache;

use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::spatial::Aabb;

/// Asset resolution errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Reading the asset failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A statement could not be parsed
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Structurally invalid data (dangling index, bad face)
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The source has no asset with this id
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// The asset parsed but contains no triangles
    #[error("Asset '{0}' contains no geometry")]
    EmptyMesh(String),
}

/// Triangle geometry for one mesh asset
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Vertex positions in object space
    pub positions: Vec<Vec3>,
    /// Triangle list indices into `positions`
    pub indices: Vec<u32>,
    /// Object-space bounds of `positions`
    pub bounds: Aabb,
}

impl MeshData {
    /// Build from positions and indices, computing bounds
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_points(positions.iter());
        Self {
            positions,
            indices,
            bounds,
        }
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Canonical cube spanning [-1, 1]
    pub fn cube() -> Self {
        let positions = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { -1.0 } else { 1.0 },
                    if i & 2 == 0 { -1.0 } else { 1.0 },
                    if i & 4 == 0 { -1.0 } else { 1.0 },
                )
            })
            .collect();

        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 1, 2, 3, // -Z
            4, 5, 6, 5, 7, 6, // +Z
            0, 1, 4, 1, 5, 4, // -Y
            2, 6, 3, 3, 6, 7, // +Y
            0, 4, 2, 2, 4, 6, // -X
            1, 3, 5, 3, 7, 5, // +X
        ];

        Self::new(positions, indices)
    }

    /// Canonical unit plane in XZ spanning [-1, 1]
    pub fn plane() -> Self {
        let positions = vec![
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 1.0),
        ];
        Self::new(positions, vec![0, 2, 1, 0, 3, 2])
    }

    /// Positions flattened to `[x, y, z]` for vertex buffer upload
    pub fn position_array(&self) -> Vec<[f32; 3]> {
        self.positions.iter().map(|p| [p.x, p.y, p.z]).collect()
    }
}

/// Where dynamic mesh geometry comes from
pub trait MeshAssetSource {
    /// Load the geometry for `asset_id`
    fn load(&self, asset_id: &str) -> Result<MeshData, AssetError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_meshes() {
        let cube = MeshData::cube();
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.bounds, Aabb::cube());
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.positions.len()));

        let plane = MeshData::plane();
        assert_eq!(plane.triangle_count(), 2);
        assert_eq!(plane.bounds.min.y, 0.0);
        assert_eq!(plane.bounds.max.y, 0.0);
    }
}

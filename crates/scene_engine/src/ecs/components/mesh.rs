//! Mesh reference component
//!
//! An entity either shows one of the built-in primitives or references an
//! external asset by id. Dynamic assets are resolved lazily through
//! [`MeshAssetCache`](crate::assets::MeshAssetCache).

use serde::{Deserialize, Serialize};

use crate::ecs::Component;
use crate::spatial::Aabb;

/// Built-in primitive meshes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveMesh {
    /// Unit cube spanning [-1, 1] on every axis
    Cube,
    /// Unit quad in the XZ plane spanning [-1, 1]
    Plane,
}

impl PrimitiveMesh {
    /// Canonical object-space bounds used for picking.
    ///
    /// The plane is given a small thickness so rays at grazing angles can
    /// still select it.
    pub fn bounds(self) -> Aabb {
        match self {
            Self::Cube => Aabb::cube(),
            Self::Plane => Aabb::plane(),
        }
    }
}

/// Mesh reference component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshComponent {
    /// A built-in primitive
    Static(PrimitiveMesh),
    /// An external asset identified by id (file path relative to the asset root)
    Dynamic {
        /// Asset identifier
        asset_id: String,
    },
}

impl MeshComponent {
    /// Built-in cube
    pub fn cube() -> Self {
        Self::Static(PrimitiveMesh::Cube)
    }

    /// Built-in plane
    pub fn plane() -> Self {
        Self::Static(PrimitiveMesh::Plane)
    }

    /// External asset
    pub fn dynamic(asset_id: impl Into<String>) -> Self {
        Self::Dynamic { asset_id: asset_id.into() }
    }

    /// Asset id for dynamic meshes
    pub fn asset_id(&self) -> Option<&str> {
        match self {
            Self::Static(_) => None,
            Self::Dynamic { asset_id } => Some(asset_id),
        }
    }
}

impl Component for MeshComponent {}

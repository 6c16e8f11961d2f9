//! Pickable component for mouse selection
//!
//! Mesh entities are pickable by default. Attaching this component lets an
//! entity opt out of picking or restrict it to specific layers.

use serde::{Deserialize, Serialize};

use crate::ecs::Component;

/// Picking overrides for a mesh entity
///
/// # Examples
/// ```
/// # use scene_engine::ecs::components::{PickableComponent, pickable::layers};
/// let pickable = PickableComponent::new().with_layer_bits(layers::WORLD);
/// assert!(pickable.matches_layer_mask(layers::ALL));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickableComponent {
    /// Whether this entity is currently pickable
    pub enabled: bool,

    /// Layer bits for filtering (bit mask); `None` matches every mask
    ///
    /// Example layer assignments:
    /// - 0b0001 (1) = World objects
    /// - 0b0010 (2) = Editor helpers
    /// - 0b0100 (4) = Locked/background objects
    pub layer_bits: Option<u32>,
}

impl PickableComponent {
    /// Create a new pickable component with default settings
    pub fn new() -> Self {
        Self {
            enabled: true,
            layer_bits: None,
        }
    }

    /// Set the enabled state
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the layer bits for filtering
    pub fn with_layer_bits(mut self, bits: u32) -> Self {
        self.layer_bits = Some(bits);
        self
    }

    /// Check if entity matches a layer mask
    pub fn matches_layer_mask(&self, mask: u32) -> bool {
        self.layer_bits.map_or(true, |bits| (mask & bits) != 0)
    }

    /// Whether picking should consider this entity under `mask`
    pub fn accepts(&self, mask: u32) -> bool {
        self.enabled && self.matches_layer_mask(mask)
    }
}

impl Component for PickableComponent {}

impl Default for PickableComponent {
    fn default() -> Self {
        Self::new()
    }
}

/// Standard layer bit definitions
pub mod layers {
    /// World objects layer (bit 0)
    pub const WORLD: u32 = 0b0001;

    /// Editor helper layer (bit 1)
    pub const EDITOR: u32 = 0b0010;

    /// Locked/background layer (bit 2)
    pub const LOCKED: u32 = 0b0100;

    /// All layers mask
    pub const ALL: u32 = 0xFFFF_FFFF;

    /// None layers mask
    pub const NONE: u32 = 0x0000_0000;
}

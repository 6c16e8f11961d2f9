//! Entity implementation

use slotmap::{DefaultKey, Key, KeyData};

/// Entity identifier
///
/// A generational handle (slot index + generation). A handle that outlives
/// its entity never aliases a newer entity in the same slot; every world
/// lookup with it simply fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    key: DefaultKey,
}

impl Entity {
    pub(super) fn from_key(key: DefaultKey) -> Self {
        Self { key }
    }

    pub(super) fn key(self) -> DefaultKey {
        self.key
    }

    /// A handle that never refers to a live entity
    pub fn null() -> Self {
        Self { key: DefaultKey::null() }
    }

    /// Whether this is the null handle
    pub fn is_null(&self) -> bool {
        self.key.is_null()
    }

    /// Pack the handle into a raw integer.
    ///
    /// Only meant for crossing serialization or FFI boundaries; the value has
    /// no meaning inside the engine.
    pub fn to_bits(&self) -> u64 {
        self.key.data().as_ffi()
    }

    /// Rebuild a handle from [`Entity::to_bits`] output
    pub fn from_bits(bits: u64) -> Self {
        Self { key: KeyData::from_ffi(bits).into() }
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::null()
    }
}

//! Scene persistence
//!
//! Worlds are saved as RON [`WorldSnapshot`]s.

pub mod snapshot;

pub use snapshot::{EntityRecord, WorldSnapshot};

use std::path::Path;

use thiserror::Error;

use crate::ecs::{EcsError, World};

/// Scene save/load errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The scene text could not be parsed
    #[error("Scene parse error: {0}")]
    Parse(String),

    /// The snapshot could not be rendered
    #[error("Scene serialization error: {0}")]
    Serialize(String),

    /// The snapshot parsed but could not be applied
    #[error("Scene rejected: {0}")]
    Ecs(#[from] EcsError),
}

/// Render a snapshot as pretty RON
pub fn to_ron_string(snapshot: &WorldSnapshot) -> Result<String, PersistenceError> {
    ron::ser::to_string_pretty(snapshot, ron::ser::PrettyConfig::default())
        .map_err(|e| PersistenceError::Serialize(e.to_string()))
}

/// Parse a snapshot from RON
pub fn from_ron_str(contents: &str) -> Result<WorldSnapshot, PersistenceError> {
    ron::from_str(contents).map_err(|e| PersistenceError::Parse(e.to_string()))
}

/// Write the world to a RON file
pub fn save_world(world: &World, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
    let path = path.as_ref();
    let contents = to_ron_string(&world.snapshot())?;
    std::fs::write(path, contents)?;
    log::info!("Saved {} entities to {}", world.entity_count(), path.display());
    Ok(())
}

/// Replace the world's contents with a RON file
pub fn load_world(world: &mut World, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    world.restore(from_ron_str(&contents)?)?;
    log::info!("Loaded {} entities from {}", world.entity_count(), path.display());
    Ok(())
}

//! # void_map - Shared Map Model
//!
//! The map that collaborators edit together: rectangular areas, placed
//! entities, floor tiles and room-wide (WAM) settings.
//!
//! The map is deliberately dumb. It exposes plain mutation primitives and
//! publishes a [`MapEvent`] after each one; deciding *when* to mutate
//! (undo, redo, rollback, replaying remote edits) is the job of the editor
//! core, which reaches the map only through its commands.
//!
//! ```ignore
//! let map = GameMap::shared();
//! map.write().add_area(AreaData::new("hall", "Main hall", 0.0, 0.0, 320.0, 240.0))?;
//!
//! let mut events = map.read().subscribe();
//! ```

pub mod area;
pub mod entity;
pub mod floor;
pub mod map;

pub use area::{AreaData, AreaId, AreaProperty};
pub use entity::{EntityData, EntityId};
pub use floor::{FloorTile, TileCoord};
pub use map::{GameMap, MapEvent, SharedMap, WamSettings};

use thiserror::Error;

/// Errors raised by map mutation primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("Area not found: {0}")]
    AreaNotFound(AreaId),

    #[error("Area already exists: {0}")]
    AreaExists(AreaId),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Entity already exists: {0}")]
    EntityExists(EntityId),
}

pub type MapResult<T> = Result<T, MapError>;

//! Floor tiles.

use serde::{Deserialize, Serialize};

/// Grid coordinate of a floor tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A tile assignment. `tile: None` erases the cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorTile {
    pub x: i32,
    pub y: i32,
    pub tile: Option<String>,
}

impl FloorTile {
    pub fn paint(x: i32, y: i32, tile: impl Into<String>) -> Self {
        Self {
            x,
            y,
            tile: Some(tile.into()),
        }
    }

    pub fn erase(x: i32, y: i32) -> Self {
        Self { x, y, tile: None }
    }

    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.x, self.y)
    }
}

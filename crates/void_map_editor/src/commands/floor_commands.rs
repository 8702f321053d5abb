//! Floor painting command.

use std::sync::Arc;

use async_trait::async_trait;
use void_map::{FloorTile, SharedMap};

use super::{Command, CommandId, CommandResult};
use crate::sync::EditMapMessage;

/// Command to paint or erase a batch of floor tiles.
#[derive(Debug)]
pub struct ModifyFloorCommand {
    id: CommandId,
    map: SharedMap,
    tiles: Vec<FloorTile>,
    previous: Vec<FloorTile>,
}

impl ModifyFloorCommand {
    pub fn new(map: SharedMap, tiles: Vec<FloorTile>, previous: Vec<FloorTile>) -> Self {
        Self::with_id(CommandId::new(), map, tiles, previous)
    }

    pub fn with_id(
        id: CommandId,
        map: SharedMap,
        tiles: Vec<FloorTile>,
        previous: Vec<FloorTile>,
    ) -> Self {
        Self {
            id,
            map,
            tiles,
            previous,
        }
    }

    /// Build a modification whose previous cell contents come from the map.
    pub fn from_map(map: SharedMap, tiles: Vec<FloorTile>) -> Self {
        Self::from_map_with_id(CommandId::new(), map, tiles)
    }

    pub fn from_map_with_id(id: CommandId, map: SharedMap, tiles: Vec<FloorTile>) -> Self {
        let previous = map.read().snapshot_tiles(&tiles);
        Self::with_id(id, map, tiles, previous)
    }
}

#[async_trait]
impl Command for ModifyFloorCommand {
    fn id(&self) -> &CommandId {
        &self.id
    }

    fn description(&self) -> &str {
        "Modify Floor"
    }

    async fn execute(&self) -> CommandResult {
        self.map.write().set_tiles(&self.tiles);
        Ok(())
    }

    fn undo_command(&self) -> Arc<dyn Command> {
        Arc::new(ModifyFloorCommand::new(
            self.map.clone(),
            self.previous.clone(),
            self.tiles.clone(),
        ))
    }

    fn payload(&self) -> EditMapMessage {
        EditMapMessage::ModifyFloor {
            tiles: self.tiles.clone(),
        }
    }
}

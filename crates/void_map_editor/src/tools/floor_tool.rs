//! Floor painting tool.

use std::sync::Arc;

use parking_lot::Mutex;
use void_map::{FloorTile, SharedMap};

use super::{EditorToolName, KeyEvent, MapEditorTool};
use crate::commands::{Command, ModifyFloorCommand};
use crate::executor::{CommandExecutor, TaskHandle};
use crate::sync::{EditMapCommandMessage, EditMapMessage};

pub struct FloorEditorTool {
    executor: CommandExecutor,
    map: SharedMap,
    /// Tile painted by the brush, `None` erases
    brush: Mutex<Option<String>>,
}

impl FloorEditorTool {
    pub fn new(executor: CommandExecutor, map: SharedMap) -> Self {
        Self {
            executor,
            map,
            brush: Mutex::new(None),
        }
    }

    /// Apply a batch of tile changes as one undoable edit.
    pub fn paint_tiles(&self, tiles: Vec<FloorTile>) -> Option<TaskHandle<()>> {
        if tiles.is_empty() {
            return None;
        }
        let map = self.map.clone();
        Some(self.executor.submit_with(move || {
            Ok(Arc::new(ModifyFloorCommand::from_map(map, tiles)) as Arc<dyn Command>)
        }))
    }

    /// Paint the current brush on `cells`.
    pub fn brush_stroke(&self, cells: &[(i32, i32)]) -> Option<TaskHandle<()>> {
        let brush = self.brush.lock().clone();
        let tiles = cells
            .iter()
            .map(|&(x, y)| match &brush {
                Some(tile) => FloorTile::paint(x, y, tile.clone()),
                None => FloorTile::erase(x, y),
            })
            .collect();
        self.paint_tiles(tiles)
    }

    pub fn set_brush(&self, tile: Option<String>) {
        *self.brush.lock() = tile;
    }

    pub fn brush(&self) -> Option<String> {
        self.brush.lock().clone()
    }
}

#[async_trait::async_trait]
impl MapEditorTool for FloorEditorTool {
    fn name(&self) -> EditorToolName {
        EditorToolName::FloorEditor
    }

    fn clear(&self) {
        self.set_brush(None);
    }

    fn handle_key_down(&self, event: &KeyEvent) {
        if event.is("e") && !event.ctrl {
            self.set_brush(None);
        }
    }

    async fn handle_incoming_command(&self, message: &EditMapCommandMessage) {
        let EditMapMessage::ModifyFloor { tiles } = &message.message else {
            return;
        };
        let (id, map, tiles) = (message.id, self.map.clone(), tiles.clone());
        let replay = self.executor.submit_local_with(move || {
            Ok(Arc::new(ModifyFloorCommand::from_map_with_id(id, map, tiles)) as Arc<dyn Command>)
        });
        if let Err(e) = replay.await {
            log::error!("Replay of {} was dropped: {}", message.id, e);
        }
    }
}

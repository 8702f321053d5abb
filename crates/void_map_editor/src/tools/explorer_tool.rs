//! Read-only room explorer.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use void_map::{AreaId, EntityId, SharedMap};

use super::{EditorToolName, MapEditorTool};
use crate::sync::{EditMapCommandMessage, EditMapMessage};

/// One line of the explorer listing.
#[derive(Clone, Debug, PartialEq)]
pub enum ExplorerEntry {
    Area { id: AreaId, name: String },
    Entity { id: EntityId, name: String },
}

/// Lists the areas and entities of the room. Never mutates the map.
pub struct ExplorerTool {
    map: SharedMap,
    entries: Mutex<Vec<ExplorerEntry>>,
    stale: AtomicBool,
}

impl ExplorerTool {
    pub fn new(map: SharedMap) -> Self {
        Self {
            map,
            entries: Mutex::new(Vec::new()),
            stale: AtomicBool::new(true),
        }
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// Current listing, rebuilt from the map if anything changed.
    pub fn entries(&self) -> Vec<ExplorerEntry> {
        if self.stale.swap(false, Ordering::SeqCst) {
            let map = self.map.read();
            let areas = map.areas().map(|area| ExplorerEntry::Area {
                id: area.id.clone(),
                name: area.name.clone(),
            });
            let entities = map.entities().map(|entity| ExplorerEntry::Entity {
                id: entity.id.clone(),
                name: entity
                    .name
                    .clone()
                    .unwrap_or_else(|| entity.prefab_ref.clone()),
            });
            *self.entries.lock() = areas.chain(entities).collect();
        }
        self.entries.lock().clone()
    }
}

#[async_trait::async_trait]
impl MapEditorTool for ExplorerTool {
    fn name(&self) -> EditorToolName {
        EditorToolName::ExploreTheRoom
    }

    fn activate(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }

    async fn handle_incoming_command(&self, message: &EditMapCommandMessage) {
        if matches!(
            message.message,
            EditMapMessage::CreateArea(_)
                | EditMapMessage::UpdateArea(_)
                | EditMapMessage::DeleteArea { .. }
                | EditMapMessage::CreateEntity(_)
                | EditMapMessage::UpdateEntity(_)
                | EditMapMessage::DeleteEntity { .. }
        ) {
            self.stale.store(true, Ordering::SeqCst);
        }
    }
}

//! Trash tool: deletes whatever is clicked.

use std::sync::Arc;

use void_map::{AreaId, EntityId};

use super::{AreaEditorTool, EditorToolName, EntityEditorTool, MapEditorTool};
use crate::executor::TaskHandle;

/// Deletion goes through the area and entity tools so that each kind of
/// object keeps a single owner. Remote commands are left to those tools.
pub struct TrashEditorTool {
    areas: Arc<AreaEditorTool>,
    entities: Arc<EntityEditorTool>,
}

impl TrashEditorTool {
    pub fn new(areas: Arc<AreaEditorTool>, entities: Arc<EntityEditorTool>) -> Self {
        Self { areas, entities }
    }

    pub fn trash_area(&self, id: &AreaId) -> TaskHandle<()> {
        self.areas.delete_area(id)
    }

    pub fn trash_entity(&self, id: &EntityId) -> TaskHandle<()> {
        self.entities.delete_entity(id)
    }
}

#[async_trait::async_trait]
impl MapEditorTool for TrashEditorTool {
    fn name(&self) -> EditorToolName {
        EditorToolName::TrashEditor
    }
}

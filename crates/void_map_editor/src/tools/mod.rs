//! Editing tools and the fixed tool table.

mod area_tool;
mod close_tool;
mod entity_tool;
mod explorer_tool;
mod floor_tool;
mod settings_tool;
mod tool;
mod trash_tool;

pub use area_tool::AreaEditorTool;
pub use close_tool::CloseTool;
pub use entity_tool::EntityEditorTool;
pub use explorer_tool::{ExplorerEntry, ExplorerTool};
pub use floor_tool::FloorEditorTool;
pub use settings_tool::WamSettingsEditorTool;
pub use tool::{EditorToolName, KeyEvent, MapEditorTool};
pub use trash_tool::TrashEditorTool;

use std::sync::Arc;

use void_map::SharedMap;

use crate::executor::CommandExecutor;
use crate::sync::EditMapCommandMessage;

/// One tool per [`EditorToolName`], in declaration order.
pub struct ToolRegistry {
    tools: [Arc<dyn MapEditorTool>; EditorToolName::COUNT],
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|tool| tool.name()))
            .finish()
    }
}

impl ToolRegistry {
    /// Build the table by asking `make` for each tool.
    pub fn new(mut make: impl FnMut(EditorToolName) -> Arc<dyn MapEditorTool>) -> Self {
        let tools = EditorToolName::ALL.map(|name| {
            let tool = make(name);
            debug_assert_eq!(tool.name(), name, "tool registered under the wrong name");
            tool
        });
        Self { tools }
    }

    /// The editor's own tools, all editing `map` through `executor`.
    pub fn standard(executor: &CommandExecutor, map: &SharedMap) -> Self {
        let areas = Arc::new(AreaEditorTool::new(executor.clone(), map.clone()));
        let entities = Arc::new(EntityEditorTool::new(executor.clone(), map.clone()));

        Self::new(|name| -> Arc<dyn MapEditorTool> {
            match name {
                EditorToolName::AreaEditor => areas.clone(),
                EditorToolName::EntityEditor => entities.clone(),
                EditorToolName::FloorEditor => {
                    Arc::new(FloorEditorTool::new(executor.clone(), map.clone()))
                }
                EditorToolName::WamSettingsEditor => {
                    Arc::new(WamSettingsEditorTool::new(executor.clone(), map.clone()))
                }
                EditorToolName::TrashEditor => {
                    Arc::new(TrashEditorTool::new(areas.clone(), entities.clone()))
                }
                EditorToolName::ExploreTheRoom => Arc::new(ExplorerTool::new(map.clone())),
                EditorToolName::CloseMapEditor => Arc::new(CloseTool),
            }
        })
    }

    pub fn get(&self, name: EditorToolName) -> &Arc<dyn MapEditorTool> {
        &self.tools[name.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn MapEditorTool>> {
        self.tools.iter()
    }

    /// Give a remote command to every tool, one after the other.
    pub async fn dispatch(&self, message: &EditMapCommandMessage) {
        for tool in &self.tools {
            tool.handle_incoming_command(message).await;
        }
    }

    pub fn subscribe_to_map_events(&self, map: &SharedMap) {
        for tool in &self.tools {
            tool.subscribe_to_map_events(map);
        }
    }

    pub fn destroy(&self) {
        for tool in &self.tools {
            tool.destroy();
        }
    }
}

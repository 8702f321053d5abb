//! Room settings tool.

use std::sync::Arc;

use void_map::SharedMap;

use super::{EditorToolName, MapEditorTool};
use crate::commands::{Command, UpdateWamSettingCommand};
use crate::executor::{CommandExecutor, TaskHandle};
use crate::sync::{EditMapCommandMessage, EditMapMessage};

/// Edits room-wide settings. Setting changes are shared but cannot be
/// undone.
pub struct WamSettingsEditorTool {
    executor: CommandExecutor,
    map: SharedMap,
}

impl WamSettingsEditorTool {
    pub fn new(executor: CommandExecutor, map: SharedMap) -> Self {
        Self { executor, map }
    }

    /// Set `name` to `value`, or remove it when `value` is `None`.
    pub fn update_setting(
        &self,
        name: impl Into<String>,
        value: Option<serde_json::Value>,
    ) -> TaskHandle<()> {
        let (map, name): (_, String) = (self.map.clone(), name.into());
        self.executor.submit_with(move || {
            Ok(Arc::new(UpdateWamSettingCommand::from_map(map, name, value)) as Arc<dyn Command>)
        })
    }

    pub fn setting(&self, name: &str) -> Option<serde_json::Value> {
        self.map.read().setting(name).cloned()
    }
}

#[async_trait::async_trait]
impl MapEditorTool for WamSettingsEditorTool {
    fn name(&self) -> EditorToolName {
        EditorToolName::WamSettingsEditor
    }

    async fn handle_incoming_command(&self, message: &EditMapCommandMessage) {
        let EditMapMessage::UpdateWamSetting { name, value } = &message.message else {
            return;
        };
        let (id, map, name, value) = (message.id, self.map.clone(), name.clone(), value.clone());
        let replay = self.executor.submit_local_with(move || {
            let command = UpdateWamSettingCommand::from_map_with_id(id, map, name, value);
            Ok(Arc::new(command) as Arc<dyn Command>)
        });
        if let Err(e) = replay.await {
            log::error!("Replay of {} was dropped: {}", message.id, e);
        }
    }
}

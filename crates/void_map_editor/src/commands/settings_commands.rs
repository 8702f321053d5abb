//! Room (WAM) settings command.

use std::sync::Arc;

use async_trait::async_trait;
use void_map::SharedMap;

use super::{Command, CommandId, CommandKind, CommandResult};
use crate::sync::EditMapMessage;

/// Command to set or remove a room setting.
///
/// Settings are administrative: they are shared with the server but never
/// recorded in the undo history.
#[derive(Debug)]
pub struct UpdateWamSettingCommand {
    id: CommandId,
    map: SharedMap,
    name: String,
    value: Option<serde_json::Value>,
    previous: Option<serde_json::Value>,
}

impl UpdateWamSettingCommand {
    pub fn new(
        map: SharedMap,
        name: impl Into<String>,
        value: Option<serde_json::Value>,
        previous: Option<serde_json::Value>,
    ) -> Self {
        Self::with_id(CommandId::new(), map, name, value, previous)
    }

    pub fn with_id(
        id: CommandId,
        map: SharedMap,
        name: impl Into<String>,
        value: Option<serde_json::Value>,
        previous: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id,
            map,
            name: name.into(),
            value,
            previous,
        }
    }

    pub fn from_map(map: SharedMap, name: impl Into<String>, value: Option<serde_json::Value>) -> Self {
        Self::from_map_with_id(CommandId::new(), map, name, value)
    }

    pub fn from_map_with_id(
        id: CommandId,
        map: SharedMap,
        name: impl Into<String>,
        value: Option<serde_json::Value>,
    ) -> Self {
        let name = name.into();
        let previous = map.read().setting(&name).cloned();
        Self::with_id(id, map, name, value, previous)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Command for UpdateWamSettingCommand {
    fn id(&self) -> &CommandId {
        &self.id
    }

    fn description(&self) -> &str {
        "Update Setting"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Settings
    }

    async fn execute(&self) -> CommandResult {
        self.map.write().update_setting(&self.name, self.value.clone());
        Ok(())
    }

    fn undo_command(&self) -> Arc<dyn Command> {
        Arc::new(UpdateWamSettingCommand::new(
            self.map.clone(),
            self.name.clone(),
            self.previous.clone(),
            self.value.clone(),
        ))
    }

    fn payload(&self) -> EditMapMessage {
        EditMapMessage::UpdateWamSetting {
            name: self.name.clone(),
            value: self.value.clone(),
        }
    }
}

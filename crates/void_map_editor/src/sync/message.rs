//! Wire envelopes exchanged with the map server.

use serde::{Deserialize, Serialize};
use void_map::{AreaData, AreaId, EntityData, EntityId, FloorTile};

use crate::commands::CommandId;

/// One command on the synchronization channel, in either direction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditMapCommandMessage {
    pub id: CommandId,
    pub message: EditMapMessage,
}

impl EditMapCommandMessage {
    pub fn new(id: CommandId, message: EditMapMessage) -> Self {
        Self { id, message }
    }

    /// Server rejection of the command with the given id.
    pub fn error(id: CommandId, reason: impl Into<String>) -> Self {
        Self {
            id,
            message: EditMapMessage::ErrorCommand {
                reason: reason.into(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.message, EditMapMessage::ErrorCommand { .. })
    }
}

/// Command-specific payload. Each tool understands a subset of these and
/// ignores the rest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum EditMapMessage {
    CreateArea(AreaData),
    UpdateArea(AreaData),
    DeleteArea { id: AreaId },
    CreateEntity(EntityData),
    UpdateEntity(EntityData),
    DeleteEntity { id: EntityId },
    ModifyFloor { tiles: Vec<FloorTile> },
    /// `value: None` removes the setting
    UpdateWamSetting {
        name: String,
        value: Option<serde_json::Value>,
    },
    ErrorCommand { reason: String },
}

impl EditMapMessage {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateArea(_) => "createArea",
            Self::UpdateArea(_) => "updateArea",
            Self::DeleteArea { .. } => "deleteArea",
            Self::CreateEntity(_) => "createEntity",
            Self::UpdateEntity(_) => "updateEntity",
            Self::DeleteEntity { .. } => "deleteEntity",
            Self::ModifyFloor { .. } => "modifyFloor",
            Self::UpdateWamSetting { .. } => "updateWamSetting",
            Self::ErrorCommand { .. } => "errorCommand",
        }
    }
}

//! Area creation, update and deletion commands.

use std::sync::Arc;

use async_trait::async_trait;
use void_map::{AreaData, AreaId, SharedMap};

use super::{Command, CommandError, CommandId, CommandResult};
use crate::sync::EditMapMessage;

/// Command to create a new area.
#[derive(Debug)]
pub struct CreateAreaCommand {
    id: CommandId,
    map: SharedMap,
    area: AreaData,
}

impl CreateAreaCommand {
    pub fn new(map: SharedMap, area: AreaData) -> Self {
        Self::with_id(CommandId::new(), map, area)
    }

    /// Replay of a command that already has a server-side id.
    pub fn with_id(id: CommandId, map: SharedMap, area: AreaData) -> Self {
        Self { id, map, area }
    }

    pub fn area(&self) -> &AreaData {
        &self.area
    }
}

#[async_trait]
impl Command for CreateAreaCommand {
    fn id(&self) -> &CommandId {
        &self.id
    }

    fn description(&self) -> &str {
        "Create Area"
    }

    async fn execute(&self) -> CommandResult {
        self.map.write().add_area(self.area.clone())?;
        Ok(())
    }

    fn undo_command(&self) -> Arc<dyn Command> {
        Arc::new(DeleteAreaCommand::new(self.map.clone(), self.area.clone()))
    }

    fn payload(&self) -> EditMapMessage {
        EditMapMessage::CreateArea(self.area.clone())
    }
}

/// Command to replace an area's data.
#[derive(Debug)]
pub struct UpdateAreaCommand {
    id: CommandId,
    map: SharedMap,
    area: AreaData,
    previous: AreaData,
}

impl UpdateAreaCommand {
    pub fn new(map: SharedMap, area: AreaData, previous: AreaData) -> Self {
        Self::with_id(CommandId::new(), map, area, previous)
    }

    pub fn with_id(id: CommandId, map: SharedMap, area: AreaData, previous: AreaData) -> Self {
        Self {
            id,
            map,
            area,
            previous,
        }
    }

    /// Build an update whose previous state is read from the map.
    pub fn from_map(map: SharedMap, area: AreaData) -> Result<Self, CommandError> {
        Self::from_map_with_id(CommandId::new(), map, area)
    }

    pub fn from_map_with_id(
        id: CommandId,
        map: SharedMap,
        area: AreaData,
    ) -> Result<Self, CommandError> {
        let previous = map
            .read()
            .area(&area.id)
            .cloned()
            .ok_or_else(|| void_map::MapError::AreaNotFound(area.id.clone()))?;
        Ok(Self::with_id(id, map, area, previous))
    }
}

#[async_trait]
impl Command for UpdateAreaCommand {
    fn id(&self) -> &CommandId {
        &self.id
    }

    fn description(&self) -> &str {
        "Update Area"
    }

    async fn execute(&self) -> CommandResult {
        if self.area.id != self.previous.id {
            return Err(CommandError::InvalidOperation(format!(
                "area id changed from {} to {}",
                self.previous.id, self.area.id
            )));
        }
        self.map.write().update_area(self.area.clone())?;
        Ok(())
    }

    fn undo_command(&self) -> Arc<dyn Command> {
        Arc::new(UpdateAreaCommand::new(
            self.map.clone(),
            self.previous.clone(),
            self.area.clone(),
        ))
    }

    fn payload(&self) -> EditMapMessage {
        EditMapMessage::UpdateArea(self.area.clone())
    }
}

/// Command to delete an area.
#[derive(Debug)]
pub struct DeleteAreaCommand {
    id: CommandId,
    map: SharedMap,
    // Stored for undo
    area: AreaData,
}

impl DeleteAreaCommand {
    pub fn new(map: SharedMap, area: AreaData) -> Self {
        Self::with_id(CommandId::new(), map, area)
    }

    pub fn with_id(id: CommandId, map: SharedMap, area: AreaData) -> Self {
        Self { id, map, area }
    }

    /// Build a deletion of the area currently stored under `area_id`.
    pub fn from_map(map: SharedMap, area_id: &AreaId) -> Result<Self, CommandError> {
        Self::from_map_with_id(CommandId::new(), map, area_id)
    }

    pub fn from_map_with_id(
        id: CommandId,
        map: SharedMap,
        area_id: &AreaId,
    ) -> Result<Self, CommandError> {
        let area = map
            .read()
            .area(area_id)
            .cloned()
            .ok_or_else(|| void_map::MapError::AreaNotFound(area_id.clone()))?;
        Ok(Self::with_id(id, map, area))
    }
}

#[async_trait]
impl Command for DeleteAreaCommand {
    fn id(&self) -> &CommandId {
        &self.id
    }

    fn description(&self) -> &str {
        "Delete Area"
    }

    async fn execute(&self) -> CommandResult {
        self.map.write().delete_area(&self.area.id)?;
        Ok(())
    }

    fn undo_command(&self) -> Arc<dyn Command> {
        Arc::new(CreateAreaCommand::new(self.map.clone(), self.area.clone()))
    }

    fn payload(&self) -> EditMapMessage {
        EditMapMessage::DeleteArea {
            id: self.area.id.clone(),
        }
    }
}

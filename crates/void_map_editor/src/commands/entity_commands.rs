//! Entity placement, update and removal commands.

use std::sync::Arc;

use async_trait::async_trait;
use void_map::{EntityData, EntityId, MapError, SharedMap};

use super::{Command, CommandError, CommandId, CommandResult};
use crate::sync::EditMapMessage;

/// Command to place a new entity.
#[derive(Debug)]
pub struct CreateEntityCommand {
    id: CommandId,
    map: SharedMap,
    entity: EntityData,
}

impl CreateEntityCommand {
    pub fn new(map: SharedMap, entity: EntityData) -> Self {
        Self::with_id(CommandId::new(), map, entity)
    }

    pub fn with_id(id: CommandId, map: SharedMap, entity: EntityData) -> Self {
        Self { id, map, entity }
    }
}

#[async_trait]
impl Command for CreateEntityCommand {
    fn id(&self) -> &CommandId {
        &self.id
    }

    fn description(&self) -> &str {
        "Create Entity"
    }

    async fn execute(&self) -> CommandResult {
        self.map.write().add_entity(self.entity.clone())?;
        Ok(())
    }

    fn undo_command(&self) -> Arc<dyn Command> {
        Arc::new(DeleteEntityCommand::new(self.map.clone(), self.entity.clone()))
    }

    fn payload(&self) -> EditMapMessage {
        EditMapMessage::CreateEntity(self.entity.clone())
    }
}

/// Command to replace an entity's data (move, rename, edit properties).
#[derive(Debug)]
pub struct UpdateEntityCommand {
    id: CommandId,
    map: SharedMap,
    entity: EntityData,
    previous: EntityData,
}

impl UpdateEntityCommand {
    pub fn new(map: SharedMap, entity: EntityData, previous: EntityData) -> Self {
        Self::with_id(CommandId::new(), map, entity, previous)
    }

    pub fn with_id(
        id: CommandId,
        map: SharedMap,
        entity: EntityData,
        previous: EntityData,
    ) -> Self {
        Self {
            id,
            map,
            entity,
            previous,
        }
    }

    pub fn from_map(map: SharedMap, entity: EntityData) -> Result<Self, CommandError> {
        Self::from_map_with_id(CommandId::new(), map, entity)
    }

    pub fn from_map_with_id(
        id: CommandId,
        map: SharedMap,
        entity: EntityData,
    ) -> Result<Self, CommandError> {
        let previous = map
            .read()
            .entity(&entity.id)
            .cloned()
            .ok_or_else(|| MapError::EntityNotFound(entity.id.clone()))?;
        Ok(Self::with_id(id, map, entity, previous))
    }
}

#[async_trait]
impl Command for UpdateEntityCommand {
    fn id(&self) -> &CommandId {
        &self.id
    }

    fn description(&self) -> &str {
        "Update Entity"
    }

    async fn execute(&self) -> CommandResult {
        self.map.write().update_entity(self.entity.clone())?;
        Ok(())
    }

    fn undo_command(&self) -> Arc<dyn Command> {
        Arc::new(UpdateEntityCommand::new(
            self.map.clone(),
            self.previous.clone(),
            self.entity.clone(),
        ))
    }

    fn payload(&self) -> EditMapMessage {
        EditMapMessage::UpdateEntity(self.entity.clone())
    }
}

/// Command to remove an entity.
#[derive(Debug)]
pub struct DeleteEntityCommand {
    id: CommandId,
    map: SharedMap,
    // Stored for undo
    entity: EntityData,
}

impl DeleteEntityCommand {
    pub fn new(map: SharedMap, entity: EntityData) -> Self {
        Self::with_id(CommandId::new(), map, entity)
    }

    pub fn with_id(id: CommandId, map: SharedMap, entity: EntityData) -> Self {
        Self { id, map, entity }
    }

    pub fn from_map(map: SharedMap, entity_id: &EntityId) -> Result<Self, CommandError> {
        Self::from_map_with_id(CommandId::new(), map, entity_id)
    }

    pub fn from_map_with_id(
        id: CommandId,
        map: SharedMap,
        entity_id: &EntityId,
    ) -> Result<Self, CommandError> {
        let entity = map
            .read()
            .entity(entity_id)
            .cloned()
            .ok_or_else(|| MapError::EntityNotFound(entity_id.clone()))?;
        Ok(Self::with_id(id, map, entity))
    }
}

#[async_trait]
impl Command for DeleteEntityCommand {
    fn id(&self) -> &CommandId {
        &self.id
    }

    fn description(&self) -> &str {
        "Delete Entity"
    }

    async fn execute(&self) -> CommandResult {
        self.map.write().delete_entity(&self.entity.id)?;
        Ok(())
    }

    fn undo_command(&self) -> Arc<dyn Command> {
        Arc::new(CreateEntityCommand::new(self.map.clone(), self.entity.clone()))
    }

    fn payload(&self) -> EditMapMessage {
        EditMapMessage::DeleteEntity {
            id: self.entity.id.clone(),
        }
    }
}

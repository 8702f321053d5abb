//! Entity placement tool.

use std::sync::Arc;

use parking_lot::Mutex;
use void_map::{EntityData, EntityId, SharedMap};

use super::{EditorToolName, KeyEvent, MapEditorTool};
use crate::commands::{
    Command, CommandError, CommandId, CommandResult, CreateEntityCommand, DeleteEntityCommand,
    UpdateEntityCommand,
};
use crate::executor::{CommandExecutor, TaskHandle};
use crate::sync::{EditMapCommandMessage, EditMapMessage};

pub struct EntityEditorTool {
    executor: CommandExecutor,
    map: SharedMap,
    /// Prefab placed by the next click
    prefab: Mutex<Option<String>>,
    selected: Mutex<Option<EntityId>>,
}

impl EntityEditorTool {
    pub fn new(executor: CommandExecutor, map: SharedMap) -> Self {
        Self {
            executor,
            map,
            prefab: Mutex::new(None),
            selected: Mutex::new(None),
        }
    }

    pub fn create_entity(&self, entity: EntityData) -> TaskHandle<()> {
        self.executor
            .submit(Arc::new(CreateEntityCommand::new(self.map.clone(), entity)))
    }

    /// Place the current prefab at `(x, y)`. Returns `None` when no prefab
    /// is chosen.
    pub fn place(&self, id: EntityId, x: f32, y: f32) -> Option<TaskHandle<()>> {
        let prefab = self.prefab.lock().clone()?;
        Some(self.create_entity(EntityData::new(id.0, prefab, x, y)))
    }

    pub fn update_entity(&self, entity: EntityData) -> TaskHandle<()> {
        let map = self.map.clone();
        self.executor.submit_with(move || {
            Ok(Arc::new(UpdateEntityCommand::from_map(map, entity)?) as Arc<dyn Command>)
        })
    }

    pub fn delete_entity(&self, id: &EntityId) -> TaskHandle<()> {
        let (map, id) = (self.map.clone(), id.clone());
        self.executor.submit_with(move || {
            Ok(Arc::new(DeleteEntityCommand::from_map(map, &id)?) as Arc<dyn Command>)
        })
    }

    pub fn set_prefab(&self, prefab: Option<String>) {
        *self.prefab.lock() = prefab;
    }

    pub fn select(&self, id: Option<EntityId>) {
        *self.selected.lock() = id;
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.selected.lock().clone()
    }
}

fn replay_command(
    id: CommandId,
    map: SharedMap,
    message: &EditMapMessage,
) -> CommandResult<Arc<dyn Command>> {
    let command: Arc<dyn Command> = match message {
        EditMapMessage::CreateEntity(entity) => {
            Arc::new(CreateEntityCommand::with_id(id, map, entity.clone()))
        }
        EditMapMessage::UpdateEntity(entity) => {
            Arc::new(UpdateEntityCommand::from_map_with_id(id, map, entity.clone())?)
        }
        EditMapMessage::DeleteEntity { id: entity_id } => {
            Arc::new(DeleteEntityCommand::from_map_with_id(id, map, entity_id)?)
        }
        other => {
            return Err(CommandError::InvalidOperation(format!(
                "{} is not an entity command",
                other.kind()
            )))
        }
    };
    Ok(command)
}

#[async_trait::async_trait]
impl MapEditorTool for EntityEditorTool {
    fn name(&self) -> EditorToolName {
        EditorToolName::EntityEditor
    }

    fn clear(&self) {
        self.set_prefab(None);
        self.select(None);
    }

    fn handle_key_down(&self, event: &KeyEvent) {
        if event.is("Escape") {
            self.clear();
            return;
        }
        if !(event.is("Delete") || event.is("Backspace")) {
            return;
        }
        if let Some(id) = self.selected() {
            self.select(None);
            drop(self.delete_entity(&id));
        }
    }

    async fn handle_incoming_command(&self, message: &EditMapCommandMessage) {
        if !matches!(
            message.message,
            EditMapMessage::CreateEntity(_)
                | EditMapMessage::UpdateEntity(_)
                | EditMapMessage::DeleteEntity { .. }
        ) {
            return;
        }
        let (id, map, payload) = (message.id, self.map.clone(), message.message.clone());
        let replay = self
            .executor
            .submit_local_with(move || replay_command(id, map, &payload));
        if let Err(e) = replay.await {
            log::error!("Replay of {} was dropped: {}", message.id, e);
        }
        // Drop a selection that no longer exists
        let mut selected = self.selected.lock();
        if let Some(id) = selected.as_ref() {
            if self.map.read().entity(id).is_none() {
                *selected = None;
            }
        }
    }
}

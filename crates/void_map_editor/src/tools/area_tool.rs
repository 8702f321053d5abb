//! Area editing tool.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::TryRecvError};
use void_map::{AreaData, AreaId, MapEvent, SharedMap};

use super::{EditorToolName, KeyEvent, MapEditorTool};
use crate::commands::{
    Command, CommandError, CommandId, CommandResult, CreateAreaCommand, DeleteAreaCommand,
    UpdateAreaCommand,
};
use crate::executor::{CommandExecutor, TaskHandle};
use crate::sync::{EditMapCommandMessage, EditMapMessage};

/// Creates, resizes and deletes areas, and keeps a preview of each area
/// for drawing.
pub struct AreaEditorTool {
    executor: CommandExecutor,
    map: SharedMap,
    active: AtomicBool,
    selected: Mutex<Option<AreaId>>,
    previews: Mutex<BTreeMap<AreaId, AreaData>>,
    events: Mutex<Option<broadcast::Receiver<MapEvent>>>,
}

impl AreaEditorTool {
    pub fn new(executor: CommandExecutor, map: SharedMap) -> Self {
        Self {
            executor,
            map,
            active: AtomicBool::new(false),
            selected: Mutex::new(None),
            previews: Mutex::new(BTreeMap::new()),
            events: Mutex::new(None),
        }
    }

    pub fn create_area(&self, area: AreaData) -> TaskHandle<()> {
        self.executor
            .submit(Arc::new(CreateAreaCommand::new(self.map.clone(), area)))
    }

    /// Replace an area. The previous state is read when the edit runs, so
    /// it reflects every edit queued before this one.
    pub fn update_area(&self, area: AreaData) -> TaskHandle<()> {
        let map = self.map.clone();
        self.executor.submit_with(move || {
            Ok(Arc::new(UpdateAreaCommand::from_map(map, area)?) as Arc<dyn Command>)
        })
    }

    pub fn delete_area(&self, id: &AreaId) -> TaskHandle<()> {
        let (map, id) = (self.map.clone(), id.clone());
        self.executor.submit_with(move || {
            Ok(Arc::new(DeleteAreaCommand::from_map(map, &id)?) as Arc<dyn Command>)
        })
    }

    pub fn select(&self, id: Option<AreaId>) {
        *self.selected.lock() = id;
    }

    pub fn selected(&self) -> Option<AreaId> {
        self.selected.lock().clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn preview(&self, id: &AreaId) -> Option<AreaData> {
        self.previews.lock().get(id).cloned()
    }

    pub fn preview_count(&self) -> usize {
        self.previews.lock().len()
    }

    fn rebuild_previews(&self) {
        let areas: BTreeMap<_, _> = self
            .map
            .read()
            .areas()
            .map(|area| (area.id.clone(), area.clone()))
            .collect();
        *self.previews.lock() = areas;
    }

    fn refresh_preview(&self, id: &AreaId) {
        let area = self.map.read().area(id).cloned();
        let mut previews = self.previews.lock();
        match area {
            Some(area) => {
                previews.insert(id.clone(), area);
            }
            None => {
                previews.remove(id);
                let mut selected = self.selected.lock();
                if selected.as_ref() == Some(id) {
                    *selected = None;
                }
            }
        }
    }
}

fn replay_command(
    id: CommandId,
    map: SharedMap,
    message: &EditMapMessage,
) -> CommandResult<Arc<dyn Command>> {
    let command: Arc<dyn Command> = match message {
        EditMapMessage::CreateArea(area) => {
            Arc::new(CreateAreaCommand::with_id(id, map, area.clone()))
        }
        EditMapMessage::UpdateArea(area) => {
            Arc::new(UpdateAreaCommand::from_map_with_id(id, map, area.clone())?)
        }
        EditMapMessage::DeleteArea { id: area_id } => {
            Arc::new(DeleteAreaCommand::from_map_with_id(id, map, area_id)?)
        }
        other => {
            return Err(CommandError::InvalidOperation(format!(
                "{} is not an area command",
                other.kind()
            )))
        }
    };
    Ok(command)
}

#[async_trait::async_trait]
impl MapEditorTool for AreaEditorTool {
    fn name(&self) -> EditorToolName {
        EditorToolName::AreaEditor
    }

    fn activate(&self) {
        self.active.store(true, Ordering::SeqCst);
        self.rebuild_previews();
    }

    fn clear(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.select(None);
        self.previews.lock().clear();
    }

    fn destroy(&self) {
        self.clear();
        self.events.lock().take();
    }

    fn update(&self, _time: f64, _delta: f64) {
        let mut guard = self.events.lock();
        let Some(events) = guard.as_mut() else {
            return;
        };

        let closed = loop {
            match events.try_recv() {
                Ok(
                    MapEvent::AreaAdded(id) | MapEvent::AreaUpdated(id) | MapEvent::AreaDeleted(id),
                ) => self.refresh_preview(&id),
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    log::debug!("Area previews lagged {} map events, rebuilding", skipped);
                    self.rebuild_previews();
                }
                Err(TryRecvError::Empty) => break false,
                Err(TryRecvError::Closed) => break true,
            }
        };
        if closed {
            guard.take();
        }
    }

    fn handle_key_down(&self, event: &KeyEvent) {
        if !(event.is("Delete") || event.is("Backspace")) {
            return;
        }
        let Some(id) = self.selected() else {
            return;
        };
        self.select(None);
        drop(self.delete_area(&id));
    }

    async fn handle_incoming_command(&self, message: &EditMapCommandMessage) {
        if !matches!(
            message.message,
            EditMapMessage::CreateArea(_)
                | EditMapMessage::UpdateArea(_)
                | EditMapMessage::DeleteArea { .. }
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
    }

    fn subscribe_to_map_events(&self, map: &SharedMap) {
        *self.events.lock() = Some(map.read().subscribe());
    }
}

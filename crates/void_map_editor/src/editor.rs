//! Map editor facade: tool modes, keyboard shortcuts and synchronization.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use void_map::{AreaData, AreaId, SharedMap};

use crate::commands::{Command, UpdateAreaCommand};
use crate::core::MapEditorConfig;
use crate::executor::{CommandExecutor, TaskHandle, TaskQueue};
use crate::net::RoomConnection;
use crate::sync::{EditMapCommandMessage, InboundOutcome, SyncProtocol, SyncResult};
use crate::tools::{EditorToolName, KeyEvent, MapEditorTool, ToolRegistry};

/// Why a personal area could not be claimed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("No area to claim")]
    NoAreaToClaim,

    #[error("Unable to claim the area, the user id is not set")]
    MissingUserId,

    #[error("Area {0} has no personal area property")]
    MissingPropertyData(AreaId),
}

#[derive(Debug, Default)]
struct ModeState {
    active: bool,
    visible: bool,
    active_tool: Option<EditorToolName>,
    /// Tool to restore when the mode is switched back on
    last_used_tool: Option<EditorToolName>,
    editor_enabled: bool,
    thematics_enabled: bool,
}

/// The map editor of one room.
pub struct MapEditor {
    config: MapEditorConfig,
    map: SharedMap,
    executor: CommandExecutor,
    tools: Arc<ToolRegistry>,
    sync: SyncProtocol,
    mode: Mutex<ModeState>,
    /// Undo and redo never overlap each other
    undo_redo: TaskQueue,
    selected_tool: watch::Sender<Option<EditorToolName>>,
}

impl std::fmt::Debug for MapEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapEditor")
            .field("mode", &*self.mode.lock())
            .field("executor", &self.executor)
            .field("tools", &self.tools)
            .finish()
    }
}

impl MapEditor {
    /// Editor with the standard tools. Must be called from within a Tokio
    /// runtime.
    pub fn new(config: MapEditorConfig, map: SharedMap) -> Self {
        let executor = CommandExecutor::with_history_limit(map.clone(), config.history_limit);
        let tools = Arc::new(ToolRegistry::standard(&executor, &map));
        Self::from_parts(config, map, executor, tools)
    }

    /// Editor around an existing executor and tool table.
    pub fn from_parts(
        config: MapEditorConfig,
        map: SharedMap,
        executor: CommandExecutor,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        tools.subscribe_to_map_events(&map);
        let sync = SyncProtocol::new(executor.clone(), tools.clone());
        let (selected_tool, _) = watch::channel(None);
        let mode = ModeState {
            editor_enabled: config.map_editor_enabled,
            thematics_enabled: config.thematics_enabled,
            ..Default::default()
        };

        Self {
            config,
            map,
            executor,
            tools,
            sync,
            mode: Mutex::new(mode),
            undo_redo: TaskQueue::spawn("undo-redo"),
            selected_tool,
        }
    }

    pub fn config(&self) -> &MapEditorConfig {
        &self.config
    }

    pub fn map(&self) -> &SharedMap {
        &self.map
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn sync(&self) -> &SyncProtocol {
        &self.sync
    }

    // Mode state machine

    /// Switch to `tool`, or to no tool.
    ///
    /// Equipping the current tool again does nothing. Otherwise the current
    /// tool is cleared before the new one is activated.
    pub fn equip_tool(&self, tool: Option<EditorToolName>) {
        let mut mode = self.mode.lock();
        self.equip_locked(&mut mode, tool);
    }

    fn equip_locked(&self, mode: &mut ModeState, tool: Option<EditorToolName>) {
        if mode.active_tool == tool {
            return;
        }
        if let Some(current) = mode.active_tool {
            self.tools.get(current).clear();
        }
        mode.active_tool = tool;
        if let Some(next) = tool {
            self.tools.get(next).activate();
        }
        log::debug!("Equipped tool {:?}", tool);
        self.selected_tool.send_replace(tool);
    }

    /// Turn the editor mode on or off. Turning it off remembers the tool in
    /// use; turning it on restores it.
    pub fn set_mode_active(&self, active: bool) {
        let mut mode = self.mode.lock();
        mode.active = active;
        if !active {
            mode.last_used_tool = mode.active_tool;
            self.equip_locked(&mut mode, None);
            return;
        }

        let tool = mode.last_used_tool.unwrap_or(
            if mode.editor_enabled || mode.thematics_enabled {
                EditorToolName::EntityEditor
            } else {
                EditorToolName::ExploreTheRoom
            },
        );
        self.equip_locked(&mut mode, Some(tool));
    }

    pub fn is_active(&self) -> bool {
        self.mode.lock().active
    }

    pub fn set_visible(&self, visible: bool) {
        self.mode.lock().visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.mode.lock().visible
    }

    pub fn set_permissions(&self, editor_enabled: bool, thematics_enabled: bool) {
        let mut mode = self.mode.lock();
        mode.editor_enabled = editor_enabled;
        mode.thematics_enabled = thematics_enabled;
    }

    pub fn active_tool(&self) -> Option<EditorToolName> {
        self.mode.lock().active_tool
    }

    /// Follow tool selection changes.
    pub fn subscribe_selected_tool(&self) -> watch::Receiver<Option<EditorToolName>> {
        self.selected_tool.subscribe()
    }

    fn current_tool(&self) -> Option<Arc<dyn MapEditorTool>> {
        self.active_tool().map(|name| self.tools.get(name).clone())
    }

    /// Route a key press. The active tool always sees it; shortcuts apply
    /// only while the editor is visible.
    ///
    /// Returns the undo or redo job when the key triggered one.
    pub fn handle_key_down(&self, event: &KeyEvent) -> Option<TaskHandle<()>> {
        if let Some(tool) = self.current_tool() {
            tool.handle_key_down(event);
        }

        let (visible, can_edit) = {
            let mode = self.mode.lock();
            (mode.visible, mode.editor_enabled)
        };
        if !visible {
            return None;
        }

        let key = event.key.to_lowercase();
        match key.as_str() {
            "dead" | "`" => self.equip_tool(Some(EditorToolName::CloseMapEditor)),
            "1" => self.equip_tool(Some(EditorToolName::ExploreTheRoom)),
            "2" if !can_edit => self.equip_tool(Some(EditorToolName::CloseMapEditor)),
            "2" => self.equip_tool(Some(EditorToolName::AreaEditor)),
            _ if !can_edit => {}
            "3" => self.equip_tool(Some(EditorToolName::EntityEditor)),
            "4" => self.equip_tool(Some(EditorToolName::WamSettingsEditor)),
            "5" => self.equip_tool(Some(EditorToolName::TrashEditor)),
            "6" => self.equip_tool(Some(EditorToolName::CloseMapEditor)),
            "z" if event.ctrl && event.shift => return Some(self.redo()),
            "z" if event.ctrl => return Some(self.undo()),
            _ => {}
        }
        None
    }

    /// Per-frame update of the active tool.
    pub fn update(&self, time: f64, delta: f64) {
        if let Some(tool) = self.current_tool() {
            tool.update(time, delta);
        }
    }

    // Commands

    pub fn undo(&self) -> TaskHandle<()> {
        let executor = self.executor.clone();
        self.undo_redo.push(async move {
            if let Err(e) = executor.undo().await {
                log::error!("Undo did not complete: {}", e);
            }
        })
    }

    pub fn redo(&self) -> TaskHandle<()> {
        let executor = self.executor.clone();
        self.undo_redo.push(async move {
            if let Err(e) = executor.redo().await {
                log::error!("Redo did not complete: {}", e);
            }
        })
    }

    /// Execute, record and share a command.
    pub fn execute_command(&self, command: Arc<dyn Command>) -> TaskHandle<()> {
        self.executor.submit(command)
    }

    /// Execute a command without recording or sharing it.
    pub fn execute_local_command(&self, command: Arc<dyn Command>) -> TaskHandle<()> {
        self.executor.submit_local(command)
    }

    // Synchronization

    pub fn handle_incoming(&self, message: EditMapCommandMessage) -> TaskHandle<InboundOutcome> {
        self.sync.receive(message)
    }

    /// Apply commands missed while away. See [`SyncProtocol::update_map_to_newest`].
    pub async fn update_map_to_newest(&self, commands: Vec<EditMapCommandMessage>) -> usize {
        self.sync.update_map_to_newest(commands).await
    }

    pub fn subscribe_to_room_connection(
        &self,
        connection: &Arc<RoomConnection>,
    ) -> SyncResult<JoinHandle<()>> {
        self.sync.subscribe_to_room_connection(connection)
    }

    /// Claim `area` as the local user's personal area.
    pub fn claim_personal_area(&self, area: Option<&AreaData>) -> Result<TaskHandle<()>, ClaimError> {
        let result = self.prepare_claim(area);
        match result {
            Ok(command) => Ok(self.executor.submit(Arc::new(command))),
            Err(e) => {
                log::error!("{}", e);
                Err(e)
            }
        }
    }

    fn prepare_claim(&self, area: Option<&AreaData>) -> Result<UpdateAreaCommand, ClaimError> {
        let area = area.ok_or(ClaimError::NoAreaToClaim)?;
        let user = self
            .config
            .user_uuid
            .as_deref()
            .ok_or(ClaimError::MissingUserId)?;

        let mut claimed = area.clone();
        if !claimed.set_owner(user) {
            return Err(ClaimError::MissingPropertyData(area.id.clone()));
        }
        Ok(UpdateAreaCommand::new(self.map.clone(), claimed, area.clone()))
    }

    /// Release the tools and stop sharing commands.
    pub fn destroy(&self) {
        self.equip_tool(None);
        self.tools.destroy();
        self.executor.detach_emitter();
    }
}

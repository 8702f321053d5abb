//! Tool trait, tool names and keyboard input.

use serde::{Deserialize, Serialize};
use void_map::SharedMap;

use crate::sync::EditMapCommandMessage;

/// Every editing mode of the map editor.
///
/// The declaration order is the order in which tools receive remote
/// commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditorToolName {
    AreaEditor,
    EntityEditor,
    FloorEditor,
    WamSettingsEditor,
    TrashEditor,
    ExploreTheRoom,
    CloseMapEditor,
}

impl EditorToolName {
    pub const COUNT: usize = 7;

    pub const ALL: [EditorToolName; Self::COUNT] = [
        Self::AreaEditor,
        Self::EntityEditor,
        Self::FloorEditor,
        Self::WamSettingsEditor,
        Self::TrashEditor,
        Self::ExploreTheRoom,
        Self::CloseMapEditor,
    ];

    /// Position in [`Self::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AreaEditor => "AreaEditor",
            Self::EntityEditor => "EntityEditor",
            Self::FloorEditor => "FloorEditor",
            Self::WamSettingsEditor => "WAMSettingsEditor",
            Self::TrashEditor => "TrashEditor",
            Self::ExploreTheRoom => "ExploreTheRoom",
            Self::CloseMapEditor => "CloseMapEditor",
        }
    }
}

impl std::fmt::Display for EditorToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key press with modifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Parse a binding such as `"ctrl+shift+z"`. `cmd` and `meta` count as
    /// ctrl.
    pub fn parse(binding: &str) -> Option<Self> {
        let binding = binding.trim();
        let (modifiers, key) = match binding.rsplit_once('+') {
            Some((modifiers, key)) if !key.is_empty() => (modifiers, key),
            // A trailing '+' is the plus key itself
            Some((modifiers, _)) => (modifiers.strip_suffix('+').unwrap_or(modifiers), "+"),
            None => ("", binding),
        };
        if key.is_empty() {
            return None;
        }

        let mut event = Self::new(key);
        for modifier in modifiers.split('+').filter(|m| !m.is_empty()) {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "cmd" | "meta" => event.ctrl = true,
                "shift" => event.shift = true,
                _ => return None,
            }
        }
        Some(event)
    }

    /// Case-insensitive key comparison.
    pub fn is(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }
}

/// An editing mode.
///
/// Tools are shared between the mode state machine and the synchronization
/// protocol, so every method takes `&self`.
#[async_trait::async_trait]
pub trait MapEditorTool: Send + Sync {
    fn name(&self) -> EditorToolName;

    /// Called when the tool becomes the active tool.
    fn activate(&self) {}

    /// Called when the tool stops being the active tool.
    fn clear(&self) {}

    /// Release everything; the tool is not used afterwards.
    fn destroy(&self) {}

    /// Per-frame update, only for the active tool.
    fn update(&self, _time: f64, _delta: f64) {}

    /// Only the active tool receives key events.
    fn handle_key_down(&self, _event: &KeyEvent) {}

    /// Apply a command received from the server, if this tool owns its
    /// kind. Completes once the command ran.
    async fn handle_incoming_command(&self, _message: &EditMapCommandMessage) {}

    /// Start following changes of `map`.
    fn subscribe_to_map_events(&self, _map: &SharedMap) {}
}

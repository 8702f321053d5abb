//! Map editor configuration.
//!
//! Persistent settings that survive restarts, stored as TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::CommandHistory;

/// Configuration loading/saving errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Map editor configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapEditorConfig {
    /// WebSocket URL of the room's map server
    pub server_url: Option<String>,
    /// Identity of the local user, needed to claim personal areas
    pub user_uuid: Option<String>,

    // Permissions
    pub map_editor_enabled: bool,
    pub thematics_enabled: bool,

    /// Maximum number of undoable commands kept
    pub history_limit: usize,

    /// env_logger filter used by the binary
    pub log_filter: String,
}

impl Default for MapEditorConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            user_uuid: None,
            map_editor_enabled: false,
            thematics_enabled: false,
            history_limit: CommandHistory::DEFAULT_MAX_LEN,
            log_filter: "info".to_string(),
        }
    }
}

impl MapEditorConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        log::info!("Loaded map editor config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        log::info!("Saved map editor config to {:?}", path);
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("void_map_editor");
            p.push("config.toml");
            p
        })
    }

    /// Whether the user may use the editing tools at all.
    pub fn can_edit(&self) -> bool {
        self.map_editor_enabled || self.thematics_enabled
    }
}

//! Command trait and result types.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use void_map::MapError;

use crate::sync::EditMapMessage;

/// Identifier correlating a command with the server's acknowledgement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(Uuid);

impl CommandId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result type for command execution and construction.
pub type CommandResult<T = ()> = Result<T, CommandError>;

/// Errors that can occur during command execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Error: {0}")]
    Other(String),
}

/// How a command interacts with the undo history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// Regular edit: recorded for undo, discards the redo branch.
    Edit,
    /// Administrative setting change: shared with the server but kept out of
    /// the undo history, so it never discards the redo branch.
    Settings,
}

/// A reversible edit of the shared map.
///
/// Commands capture everything their inverse needs when they are built and
/// are never mutated afterwards. The inverse is a standalone command with its
/// own id, so it can be executed, shared and acknowledged like any other.
///
/// A command whose inverse is read from the map must be built once the
/// commands queued before it have run; see
/// [`CommandExecutor::submit_with`](crate::executor::CommandExecutor::submit_with).
///
/// Commands do not know about the network. [`Command::payload`] describes the
/// edit as data; sending it is the job of the executor's emitter.
///
/// # Example
///
/// ```ignore
/// #[async_trait]
/// impl Command for RenameAreaCommand {
///     fn id(&self) -> &CommandId { &self.id }
///     fn description(&self) -> &str { "Rename Area" }
///
///     async fn execute(&self) -> CommandResult {
///         self.map.write().update_area(self.renamed.clone())?;
///         Ok(())
///     }
///
///     fn undo_command(&self) -> Arc<dyn Command> {
///         Arc::new(RenameAreaCommand::new(self.map.clone(), self.original.clone(), self.renamed.clone()))
///     }
///
///     fn payload(&self) -> EditMapMessage {
///         EditMapMessage::UpdateArea(self.renamed.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait Command: Send + Sync + std::fmt::Debug {
    fn id(&self) -> &CommandId;

    /// Human-readable description for logs and the undo/redo menu.
    fn description(&self) -> &str;

    fn kind(&self) -> CommandKind {
        CommandKind::Edit
    }

    /// Apply the edit to the map.
    async fn execute(&self) -> CommandResult;

    /// Build the command that reverts this one.
    fn undo_command(&self) -> Arc<dyn Command>;

    /// Wire payload sent to the server alongside [`Command::id`].
    fn payload(&self) -> EditMapMessage;
}

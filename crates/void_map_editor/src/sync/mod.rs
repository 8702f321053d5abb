//! Synchronization with the map server.
//!
//! The server is the source of truth. Every command the client sends comes
//! back either as an acknowledgement (same id, in send order) or as an error
//! for that id. Anything else means the server applied something the client
//! did not expect next, and all unacknowledged local work is rolled back.

mod message;
mod protocol;

pub use message::{EditMapCommandMessage, EditMapMessage};
pub use protocol::{InboundOutcome, SyncProtocol};

use thiserror::Error;

use crate::commands::CommandError;
use crate::net::TransportError;

/// Synchronization errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No connection attached to room to emit map editor update")]
    NotConnected,

    #[error("Room connection is already subscribed")]
    AlreadySubscribed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

pub type SyncResult<T> = Result<T, SyncError>;

//! Void Engine Collaborative Map Editor
//!
//! Client-side core that lets several participants edit the same map in
//! real time while the server stays the source of truth.
//!
//! ## Architecture
//!
//! ```text
//! User Input → Tool → Command → CommandExecutor → History / PendingQueue → RoomConnection
//!                                      ↑
//! RoomConnection → SyncProtocol ─ ack / reject / rollback ─┘
//!                        └─ remote command → every Tool → local-only Command
//! ```
//!
//! - **Commands** are reversible edits. They are applied optimistically,
//!   recorded for undo and sent to the server.
//! - The **executor** runs exactly one command at a time, in submission
//!   order, and never while a rollback is unwinding.
//! - The **sync protocol** matches server messages against the commands
//!   still waiting for acknowledgement. When the server reports something
//!   the client did not expect next, every unacknowledged command is rolled
//!   back and the server's command is applied instead.
//! - **Tools** are the editing modes; the [`MapEditor`] switches between them
//!   and broadcasts remote commands to all of them.

pub mod commands;
pub mod core;
pub mod editor;
pub mod executor;
pub mod net;
pub mod sync;
pub mod tools;

pub use commands::{Command, CommandError, CommandId, CommandKind, CommandResult};
pub use crate::core::{CommandHistory, MapEditorConfig, PendingQueue};
pub use editor::{ClaimError, MapEditor};
pub use executor::{CommandEmitter, CommandExecutor, MapStateHook, TaskError, TaskHandle, TaskQueue};
pub use net::{RoomConnection, Transport, TransportError, WebSocketTransport};
pub use sync::{EditMapCommandMessage, EditMapMessage, InboundOutcome, SyncError, SyncProtocol, SyncResult};
pub use tools::{EditorToolName, KeyEvent, MapEditorTool, ToolRegistry};

/// Editor version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Serialized command execution and rollback.
//!
//! All map mutations driven by the editor happen inside jobs of a single
//! FIFO queue, or inside a rollback that excludes those jobs. This is the
//! only thing keeping local edits, undo/redo, remote replays and rollbacks
//! from interleaving.

mod command_executor;
mod rollback;
mod task_queue;

pub use command_executor::{CommandEmitter, CommandExecutor, MapStateHook};
pub use task_queue::{TaskError, TaskHandle, TaskQueue};

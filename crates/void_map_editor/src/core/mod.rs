//! Core bookkeeping: undo history, pending acknowledgements and configuration.

mod config;
mod history;
mod pending;

pub use config::{ConfigError, MapEditorConfig};
pub use history::CommandHistory;
pub use pending::PendingQueue;

/// Local view of the command stream: what can be undone and what the server
/// has not confirmed yet.
#[derive(Debug, Default)]
pub struct SyncLedger {
    pub history: CommandHistory,
    pub pending: PendingQueue,
}

impl SyncLedger {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history: CommandHistory::with_capacity(history_limit),
            pending: PendingQueue::new(),
        }
    }
}

//! Conflict resolution by total rollback of unacknowledged commands.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::CommandExecutor;
use crate::commands::Command;

impl CommandExecutor {
    /// Unwind every pending command, most recently sent first.
    ///
    /// Each command's inverse is executed and the command is removed from
    /// the history if it is there. No command job runs while this is in
    /// progress, and jobs submitted meanwhile start only after it returns.
    ///
    /// Returns the number of commands reverted.
    pub async fn revert_pending_commands(&self) -> usize {
        let _gate = self.inner.revert_gate.write().await;
        self.inner.reverting.store(true, Ordering::SeqCst);
        log::debug!("Reverting pending commands");

        let mut reverted = 0;
        while let Some(command) = self.pop_latest_pending() {
            if let Err(e) = command.undo_command().execute().await {
                log::error!(
                    "Could not revert {} ({}): {}",
                    command.id(),
                    command.description(),
                    e
                );
            }

            // Also drop it from local history, it never happened
            if self.inner.ledger.lock().history.remove(command.id()).is_some() {
                log::debug!("Removed reverted command {} from history", command.id());
            }
            reverted += 1;
        }

        self.inner.reverting.store(false, Ordering::SeqCst);
        log::debug!("Reverted {} pending command(s)", reverted);
        reverted
    }

    fn pop_latest_pending(&self) -> Option<Arc<dyn Command>> {
        self.inner.ledger.lock().pending.pop_latest()
    }
}

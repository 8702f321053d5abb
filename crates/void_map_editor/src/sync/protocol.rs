//! Inbound message handling and catch-up.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::{EditMapCommandMessage, EditMapMessage, SyncError, SyncResult};
use crate::executor::{CommandExecutor, TaskHandle, TaskQueue};
use crate::net::RoomConnection;
use crate::tools::ToolRegistry;

/// What happened to an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// The server rejected one of our commands. `removed` tells whether it
    /// was still pending.
    Rejected { removed: bool },
    /// The server acknowledged the head of the pending queue.
    Acknowledged,
    /// Applied as a remote command, after reverting `reverted` pending
    /// commands.
    Applied { reverted: usize },
}

enum HeadMatch {
    Acknowledged,
    Diverged,
    Empty,
}

/// Reconciles the server's command stream with local optimistic edits.
#[derive(Clone)]
pub struct SyncProtocol {
    executor: CommandExecutor,
    tools: Arc<ToolRegistry>,
    /// One inbound message in flight at a time
    inbound: TaskQueue,
}

impl SyncProtocol {
    /// Must be called from within a Tokio runtime.
    pub fn new(executor: CommandExecutor, tools: Arc<ToolRegistry>) -> Self {
        Self {
            executor,
            tools,
            inbound: TaskQueue::spawn("inbound-commands"),
        }
    }

    /// Queue a server message behind the ones already received.
    pub fn receive(&self, message: EditMapCommandMessage) -> TaskHandle<InboundOutcome> {
        let this = self.clone();
        self.inbound.push(async move { this.handle(message).await })
    }

    /// Process one server message.
    ///
    /// Callers must not run this concurrently with itself; [`Self::receive`]
    /// takes care of that.
    pub async fn handle(&self, message: EditMapCommandMessage) -> InboundOutcome {
        if let EditMapMessage::ErrorCommand { reason } = &message.message {
            log::debug!("ErrorCommandMessage received for {}: {}", message.id, reason);
            let removed = self
                .executor
                .with_ledger(|ledger| ledger.pending.remove(&message.id))
                .is_some();
            if removed {
                log::debug!("Removing rejected command {} from pending list", message.id);
            }
            return InboundOutcome::Rejected { removed };
        }

        log::debug!("Received command from server: {} ({})", message.id, message.message.kind());

        let head = self.executor.with_ledger(|ledger| {
            match ledger.pending.head_id().map(|head| *head == message.id) {
                Some(true) => {
                    ledger.pending.acknowledge();
                    HeadMatch::Acknowledged
                }
                Some(false) => HeadMatch::Diverged,
                None => HeadMatch::Empty,
            }
        });

        let reverted = match head {
            HeadMatch::Acknowledged => {
                log::debug!("Command {} acknowledged", message.id);
                return InboundOutcome::Acknowledged;
            }
            HeadMatch::Diverged => {
                log::info!("Server diverged from local edits at {}, rolling back", message.id);
                self.executor.revert_pending_commands().await
            }
            HeadMatch::Empty => 0,
        };

        // Remote command execution
        self.tools.dispatch(&message).await;
        InboundOutcome::Applied { reverted }
    }

    /// Apply commands missed while away, without recording or sharing them.
    ///
    /// Returns the number of commands applied.
    pub async fn update_map_to_newest(&self, commands: Vec<EditMapCommandMessage>) -> usize {
        if commands.is_empty() {
            return 0;
        }

        log::info!(
            "Map is not up to date. Updating by applying {} missing commands.",
            commands.len()
        );
        for command in &commands {
            self.tools.dispatch(command).await;
        }
        commands.len()
    }

    /// Share executed commands on `connection` and process everything it
    /// receives.
    pub fn subscribe_to_room_connection(
        &self,
        connection: &Arc<RoomConnection>,
    ) -> SyncResult<JoinHandle<()>> {
        let mut incoming = connection.take_incoming().ok_or(SyncError::AlreadySubscribed)?;
        self.executor.attach_emitter(connection.clone());

        let this = self.clone();
        Ok(tokio::spawn(async move {
            while let Some(message) = incoming.recv().await {
                // Completion is observed through the map and the ledger
                drop(this.receive(message));
            }
            log::info!("Room connection closed, stopped receiving map commands");
        }))
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }
}

//! Commands sent to the server and not yet acknowledged.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::commands::{Command, CommandId};

/// FIFO of unacknowledged commands, in transmission order.
///
/// The server acknowledges strictly in order, so acknowledgements are matched
/// against the head. Rollback unwinds from the tail.
#[derive(Default)]
pub struct PendingQueue {
    commands: VecDeque<Arc<dyn Command>>,
}

impl std::fmt::Debug for PendingQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.commands.iter().map(|c| c.id())).finish()
    }
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn push(&mut self, command: Arc<dyn Command>) {
        log::debug!("Adding command to pending list: {} ({})", command.id(), command.description());
        self.commands.push_back(command);
    }

    /// Id of the next command the server is expected to acknowledge.
    pub fn head_id(&self) -> Option<&CommandId> {
        self.commands.front().map(|c| c.id())
    }

    /// Remove the head after the server acknowledged it.
    pub fn acknowledge(&mut self) -> Option<Arc<dyn Command>> {
        self.commands.pop_front()
    }

    /// Remove the most recently sent command, for rollback.
    pub fn pop_latest(&mut self) -> Option<Arc<dyn Command>> {
        self.commands.pop_back()
    }

    /// Remove a command the server rejected.
    pub fn remove(&mut self, id: &CommandId) -> Option<Arc<dyn Command>> {
        let index = self.commands.iter().position(|c| c.id() == id)?;
        self.commands.remove(index)
    }

    pub fn contains(&self, id: &CommandId) -> bool {
        self.commands.iter().any(|c| c.id() == id)
    }

    pub fn ids(&self) -> Vec<CommandId> {
        self.commands.iter().map(|c| *c.id()).collect()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

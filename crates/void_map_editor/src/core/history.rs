//! Linear undo/redo history with a cursor.
//!
//! Entries `0..=cursor` are currently applied and can be undone; entries past
//! the cursor were undone and can be redone. Recording a new command while
//! the cursor is not at the end discards that redo branch.

use std::sync::Arc;

use crate::commands::{Command, CommandId};

/// Undo/redo history of locally executed commands.
pub struct CommandHistory {
    commands: Vec<Arc<dyn Command>>,
    /// Index of the most recently applied command; `None` when nothing is applied
    cursor: Option<usize>,
    /// Maximum history size
    max_len: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHistory")
            .field("len", &self.commands.len())
            .field("cursor", &self.cursor)
            .field("max_len", &self.max_len)
            .finish()
    }
}

impl CommandHistory {
    /// Default maximum history size.
    pub const DEFAULT_MAX_LEN: usize = 256;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_MAX_LEN)
    }

    pub fn with_capacity(max_len: usize) -> Self {
        Self {
            commands: Vec::new(),
            cursor: None,
            max_len: max_len.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Index of the most recently applied command.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Cursor as a signed index, `-1` when nothing is applied.
    pub fn current_index(&self) -> isize {
        self.cursor.map_or(-1, |c| c as isize)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.redo_index().is_some()
    }

    fn redo_index(&self) -> Option<usize> {
        let next = self.cursor.map_or(0, |c| c + 1);
        (next < self.commands.len()).then_some(next)
    }

    /// Command that `undo` would revert.
    pub fn undo_target(&self) -> Option<Arc<dyn Command>> {
        self.cursor.map(|c| Arc::clone(&self.commands[c]))
    }

    /// Command that `redo` would re-apply.
    pub fn redo_target(&self) -> Option<Arc<dyn Command>> {
        self.redo_index().map(|i| Arc::clone(&self.commands[i]))
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.cursor.map(|c| self.commands[c].description())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_index().map(|i| self.commands[i].description())
    }

    /// Record a command that has just been executed.
    pub fn push(&mut self, command: Arc<dyn Command>) {
        // Discard the redo branch
        let keep = self.cursor.map_or(0, |c| c + 1);
        if keep < self.commands.len() {
            log::debug!(
                "Discarding {} redoable command(s)",
                self.commands.len() - keep
            );
            self.commands.truncate(keep);
        }

        self.commands.push(command);
        self.cursor = Some(self.commands.len() - 1);

        // Trim if over limit
        while self.commands.len() > self.max_len {
            self.commands.remove(0);
            self.cursor = self.cursor.and_then(|c| c.checked_sub(1));
        }
    }

    /// Move the cursor back after a successful undo.
    pub fn step_back(&mut self) {
        self.cursor = self.cursor.and_then(|c| c.checked_sub(1));
    }

    /// Move the cursor forward after a successful redo.
    pub fn step_forward(&mut self) {
        if let Some(next) = self.redo_index() {
            self.cursor = Some(next);
        }
    }

    /// Drop the entry at the cursor after an undo or redo failed, moving the
    /// cursor back one step.
    ///
    /// With nothing applied there is no entry at the cursor; the first
    /// redoable entry (the one a redo just failed on) is dropped instead.
    pub fn evict_current(&mut self) -> Option<Arc<dyn Command>> {
        match self.cursor {
            Some(c) => {
                self.cursor = c.checked_sub(1);
                Some(self.commands.remove(c))
            }
            None if !self.commands.is_empty() => Some(self.commands.remove(0)),
            None => None,
        }
    }

    /// Remove the command with the given id, wherever it sits.
    ///
    /// The cursor moves back only when the removed entry was applied.
    pub fn remove(&mut self, id: &CommandId) -> Option<Arc<dyn Command>> {
        let index = self.position(id)?;
        let removed = self.commands.remove(index);
        if let Some(c) = self.cursor {
            if index <= c {
                self.cursor = c.checked_sub(1);
            }
        }
        Some(removed)
    }

    pub fn position(&self, id: &CommandId) -> Option<usize> {
        self.commands.iter().position(|c| c.id() == id)
    }

    pub fn contains(&self, id: &CommandId) -> bool {
        self.position(id).is_some()
    }

    pub fn ids(&self) -> Vec<CommandId> {
        self.commands.iter().map(|c| *c.id()).collect()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.cursor = None;
    }
}

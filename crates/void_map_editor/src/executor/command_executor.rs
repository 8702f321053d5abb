//! Serialized command execution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::{TaskHandle, TaskQueue};
use crate::commands::{Command, CommandId, CommandKind, CommandResult};
use crate::core::{CommandHistory, SyncLedger};
use crate::sync::{EditMapCommandMessage, SyncError, SyncResult};

/// Receives the id of every command applied to the map, local or remote.
pub trait MapStateHook: Send + Sync {
    fn update_last_command_id(&self, id: &CommandId);
}

impl MapStateHook for RwLock<void_map::GameMap> {
    fn update_last_command_id(&self, id: &CommandId) {
        self.write().update_last_command_id(id.to_string());
    }
}

/// Transport adapter that shares executed commands with the server.
pub trait CommandEmitter: Send + Sync {
    fn emit(&self, message: EditMapCommandMessage) -> SyncResult<()>;
}

pub(super) struct ExecutorInner {
    pub(super) ledger: Mutex<SyncLedger>,
    /// Held for writing while a rollback unwinds; every job reads it first
    pub(super) revert_gate: tokio::sync::RwLock<()>,
    pub(super) reverting: AtomicBool,
    hook: Arc<dyn MapStateHook>,
    emitter: RwLock<Option<Arc<dyn CommandEmitter>>>,
}

/// Runs commands one at a time, in submission order.
///
/// Cloning is cheap; clones share the same queue and ledger.
#[derive(Clone)]
pub struct CommandExecutor {
    pub(super) inner: Arc<ExecutorInner>,
    queue: TaskQueue,
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("ledger", &*self.inner.ledger.lock())
            .field("reverting", &self.is_reverting())
            .finish()
    }
}

impl CommandExecutor {
    /// Create an executor. Must be called from within a Tokio runtime.
    pub fn new(hook: Arc<dyn MapStateHook>) -> Self {
        Self::with_history_limit(hook, CommandHistory::DEFAULT_MAX_LEN)
    }

    pub fn with_history_limit(hook: Arc<dyn MapStateHook>, history_limit: usize) -> Self {
        Self {
            inner: Arc::new(ExecutorInner {
                ledger: Mutex::new(SyncLedger::new(history_limit)),
                revert_gate: tokio::sync::RwLock::new(()),
                reverting: AtomicBool::new(false),
                hook,
                emitter: RwLock::new(None),
            }),
            queue: TaskQueue::spawn("command-executor"),
        }
    }

    /// Attach the connection executed commands are shared on.
    pub fn attach_emitter(&self, emitter: Arc<dyn CommandEmitter>) {
        *self.inner.emitter.write() = Some(emitter);
    }

    pub fn detach_emitter(&self) {
        *self.inner.emitter.write() = None;
    }

    pub fn has_emitter(&self) -> bool {
        self.inner.emitter.read().is_some()
    }

    /// Execute a command, record it for undo and share it with the server.
    ///
    /// Failures are logged and swallowed: the command is simply not recorded.
    pub fn submit(&self, command: Arc<dyn Command>) -> TaskHandle<()> {
        self.submit_with(move || Ok(command))
    }

    /// Like [`submit`](Self::submit), but the command is built inside the
    /// job, after every job queued before it has run.
    ///
    /// Use this when the command snapshots map state for its inverse. A
    /// build error is logged and nothing is recorded.
    pub fn submit_with<F>(&self, build: F) -> TaskHandle<()>
    where
        F: FnOnce() -> CommandResult<Arc<dyn Command>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        self.queue.push(async move {
            let _gate = inner.revert_gate.read().await;
            match build() {
                Ok(command) => inner.run_shared(command).await,
                Err(e) => log::warn!("Could not build command: {}", e),
            }
        })
    }

    /// Execute a command that must not be shared or undone, such as a remote
    /// command being replayed.
    pub fn submit_local(&self, command: Arc<dyn Command>) -> TaskHandle<()> {
        self.submit_local_with(move || Ok(command))
    }

    pub fn submit_local_with<F>(&self, build: F) -> TaskHandle<()>
    where
        F: FnOnce() -> CommandResult<Arc<dyn Command>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        self.queue.push(async move {
            let _gate = inner.revert_gate.read().await;
            match build() {
                Ok(command) => inner.run_local(command).await,
                Err(e) => log::warn!("Could not build local command: {}", e),
            }
        })
    }

    /// Revert the command at the history cursor.
    pub fn undo(&self) -> TaskHandle<()> {
        let inner = Arc::clone(&self.inner);
        self.queue.push(async move {
            let _gate = inner.revert_gate.read().await;
            inner.run_undo().await;
        })
    }

    /// Re-apply the command after the history cursor.
    pub fn redo(&self) -> TaskHandle<()> {
        let inner = Arc::clone(&self.inner);
        self.queue.push(async move {
            let _gate = inner.revert_gate.read().await;
            inner.run_redo().await;
        })
    }

    /// Whether a rollback is currently unwinding pending commands.
    pub fn is_reverting(&self) -> bool {
        self.inner.reverting.load(Ordering::SeqCst)
    }

    /// Wait until no rollback is in flight.
    pub async fn wait_for_revert(&self) {
        drop(self.inner.revert_gate.read().await);
    }

    /// Run `f` with the ledger locked.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&mut SyncLedger) -> R) -> R {
        f(&mut self.inner.ledger.lock())
    }

    pub fn history_len(&self) -> usize {
        self.inner.ledger.lock().history.len()
    }

    /// History cursor, `-1` when nothing is applied.
    pub fn current_index(&self) -> isize {
        self.inner.ledger.lock().history.current_index()
    }

    pub fn history_ids(&self) -> Vec<CommandId> {
        self.inner.ledger.lock().history.ids()
    }

    pub fn pending_ids(&self) -> Vec<CommandId> {
        self.inner.ledger.lock().pending.ids()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.ledger.lock().pending.len()
    }
}

impl ExecutorInner {
    fn emit(&self, command: &dyn Command) -> SyncResult<()> {
        let emitter = self.emitter.read().clone().ok_or(SyncError::NotConnected)?;
        emitter.emit(EditMapCommandMessage::new(*command.id(), command.payload()))
    }

    async fn run_shared(&self, command: Arc<dyn Command>) {
        if let Err(e) = command.execute().await {
            log::warn!("Command {} ({}) failed: {}", command.id(), command.description(), e);
            return;
        }
        if let Err(e) = self.emit(command.as_ref()) {
            log::error!("Could not share command {}: {}", command.id(), e);
            return;
        }

        {
            let mut ledger = self.ledger.lock();
            if command.kind() == CommandKind::Edit {
                ledger.history.push(Arc::clone(&command));
            }
            ledger.pending.push(Arc::clone(&command));
        }
        self.hook.update_last_command_id(command.id());
    }

    async fn run_local(&self, command: Arc<dyn Command>) {
        match command.execute().await {
            Ok(()) => self.hook.update_last_command_id(command.id()),
            Err(e) => log::warn!(
                "Local command {} ({}) failed: {}",
                command.id(),
                command.description(),
                e
            ),
        }
    }

    async fn run_undo(&self) {
        let Some(command) = self.ledger.lock().history.undo_target() else {
            return;
        };
        let inverse = command.undo_command();

        let result = match inverse.execute().await {
            Ok(()) => self.emit(inverse.as_ref()),
            Err(e) => Err(e.into()),
        };

        let mut ledger = self.ledger.lock();
        match result {
            Ok(()) => {
                ledger.pending.push(Arc::clone(&inverse));
                ledger.history.step_back();
                drop(ledger);
                self.hook.update_last_command_id(inverse.id());
            }
            Err(e) => {
                ledger.history.evict_current();
                log::warn!(
                    "Undo of {} ({}) failed, dropped from history; map may no longer match history: {}",
                    command.id(),
                    command.description(),
                    e
                );
            }
        }
    }

    async fn run_redo(&self) {
        let Some(command) = self.ledger.lock().history.redo_target() else {
            return;
        };

        let result = match command.execute().await {
            Ok(()) => self.emit(command.as_ref()),
            Err(e) => Err(e.into()),
        };

        let mut ledger = self.ledger.lock();
        match result {
            Ok(()) => {
                ledger.pending.push(Arc::clone(&command));
                ledger.history.step_forward();
                drop(ledger);
                self.hook.update_last_command_id(command.id());
            }
            Err(e) => {
                ledger.history.evict_current();
                log::warn!(
                    "Redo of {} ({}) failed, history entry dropped; map may no longer match history: {}",
                    command.id(),
                    command.description(),
                    e
                );
            }
        }
    }
}

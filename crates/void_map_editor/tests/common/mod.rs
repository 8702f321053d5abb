//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use void_map::{AreaData, GameMap, SharedMap};
use void_map_editor::sync::{EditMapCommandMessage, EditMapMessage};
use void_map_editor::{
    Command, CommandEmitter, CommandError, CommandExecutor, CommandId, CommandResult, SyncResult,
    SyncProtocol, ToolRegistry,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Emitter that keeps everything it is asked to send.
#[derive(Default)]
pub struct RecordingEmitter {
    sent: Mutex<Vec<EditMapCommandMessage>>,
}

impl RecordingEmitter {
    pub fn sent(&self) -> Vec<EditMapCommandMessage> {
        self.sent.lock().clone()
    }

    pub fn sent_kinds(&self) -> Vec<&'static str> {
        self.sent.lock().iter().map(|m| m.message.kind()).collect()
    }
}

impl CommandEmitter for RecordingEmitter {
    fn emit(&self, message: EditMapCommandMessage) -> SyncResult<()> {
        self.sent.lock().push(message);
        Ok(())
    }
}

pub type ExecutionLog = Arc<Mutex<Vec<String>>>;

/// Command that only writes to an execution log.
#[derive(Debug)]
pub struct LogCommand {
    id: CommandId,
    label: String,
    log: ExecutionLog,
    fail: bool,
    /// Execution waits here between "start" and "end"
    hold: Option<Arc<Notify>>,
    /// Handed to the inverse as its `hold`
    hold_undo: Option<Arc<Notify>>,
}

impl LogCommand {
    pub fn new(label: &str, log: &ExecutionLog) -> Arc<Self> {
        Arc::new(Self {
            id: CommandId::new(),
            label: label.to_string(),
            log: log.clone(),
            fail: false,
            hold: None,
            hold_undo: None,
        })
    }

    pub fn failing(label: &str, log: &ExecutionLog) -> Arc<Self> {
        Arc::new(Self {
            id: CommandId::new(),
            label: label.to_string(),
            log: log.clone(),
            fail: true,
            hold: None,
            hold_undo: None,
        })
    }

    /// Command whose undo does not finish until `gate` is notified.
    pub fn with_held_undo(label: &str, log: &ExecutionLog, gate: &Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            id: CommandId::new(),
            label: label.to_string(),
            log: log.clone(),
            fail: false,
            hold: None,
            hold_undo: Some(gate.clone()),
        })
    }
}

#[async_trait]
impl Command for LogCommand {
    fn id(&self) -> &CommandId {
        &self.id
    }

    fn description(&self) -> &str {
        &self.label
    }

    async fn execute(&self) -> CommandResult {
        self.log.lock().push(format!("start {}", self.label));
        match &self.hold {
            Some(gate) => gate.notified().await,
            None => tokio::task::yield_now().await,
        }
        self.log.lock().push(format!("end {}", self.label));
        if self.fail {
            return Err(CommandError::Other(format!("{} failed", self.label)));
        }
        Ok(())
    }

    fn undo_command(&self) -> Arc<dyn Command> {
        Arc::new(LogCommand {
            id: CommandId::new(),
            label: format!("undo {}", self.label),
            log: self.log.clone(),
            fail: self.fail,
            hold: self.hold_undo.clone(),
            hold_undo: None,
        })
    }

    fn payload(&self) -> EditMapMessage {
        EditMapMessage::UpdateWamSetting {
            name: self.label.clone(),
            value: None,
        }
    }
}

/// Yield until `entry` shows up in the log.
pub async fn wait_for_entry(log: &ExecutionLog, entry: &str) {
    while !log.lock().iter().any(|e| e == entry) {
        tokio::task::yield_now().await;
    }
}

/// Labels of finished executions, in order.
pub fn finished(log: &ExecutionLog) -> Vec<String> {
    log.lock()
        .iter()
        .filter_map(|entry| entry.strip_prefix("end ").map(str::to_string))
        .collect()
}

/// Executor over a fresh map, sharing through a recording emitter.
pub fn executor() -> (SharedMap, CommandExecutor, Arc<RecordingEmitter>) {
    init_logger();
    let map = GameMap::shared();
    let executor = CommandExecutor::new(map.clone());
    let emitter = Arc::new(RecordingEmitter::default());
    executor.attach_emitter(emitter.clone());
    (map, executor, emitter)
}

/// Executor plus the standard tools and a sync protocol.
pub fn synced() -> (SharedMap, CommandExecutor, Arc<RecordingEmitter>, SyncProtocol) {
    let (map, executor, emitter) = executor();
    let tools = Arc::new(ToolRegistry::standard(&executor, &map));
    let sync = SyncProtocol::new(executor.clone(), tools);
    (map, executor, emitter, sync)
}

pub fn area(id: &str) -> AreaData {
    AreaData::new(id, format!("Area {}", id), 0.0, 0.0, 32.0, 32.0)
}

//! Integration tests for acknowledgement, rejection, rollback and catch-up.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{area, executor, finished, synced, ExecutionLog, LogCommand};
use void_map::{AreaId, FloorTile, TileCoord};
use void_map_editor::commands::CreateAreaCommand;
use void_map_editor::sync::{EditMapCommandMessage, EditMapMessage};
use void_map_editor::{
    Command, CommandExecutor, CommandId, EditorToolName, InboundOutcome, MapEditorTool,
    RoomConnection, SyncProtocol, ToolRegistry,
};

/// Tool that takes a while over messages labelled "slow".
struct SlowTool {
    name: EditorToolName,
    log: ExecutionLog,
}

#[async_trait::async_trait]
impl MapEditorTool for SlowTool {
    fn name(&self) -> EditorToolName {
        self.name
    }

    async fn handle_incoming_command(&self, message: &EditMapCommandMessage) {
        let label = match &message.message {
            EditMapMessage::UpdateWamSetting { name, .. } => name.clone(),
            other => other.kind().to_string(),
        };
        self.log.lock().push(format!("start {} {}", label, self.name));
        if label == "slow" {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.log.lock().push(format!("end {} {}", label, self.name));
    }
}

fn setting(name: &str) -> EditMapCommandMessage {
    remote(EditMapMessage::UpdateWamSetting {
        name: name.to_string(),
        value: None,
    })
}

fn remote(message: EditMapMessage) -> EditMapCommandMessage {
    EditMapCommandMessage::new(CommandId::new(), message)
}

fn echo(command: &dyn Command) -> EditMapCommandMessage {
    EditMapCommandMessage::new(*command.id(), command.payload())
}

async fn settle(executor: &CommandExecutor, pending: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while executor.pending_len() != pending {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("pending queue did not settle");
}

#[tokio::test]
async fn test_ack_dequeues_head_without_reapplying() {
    let (map, executor, _emitter, sync) = synced();
    let create = Arc::new(CreateAreaCommand::new(map.clone(), area("hall")));
    executor.submit(create.clone()).await.unwrap();

    let outcome = sync.receive(echo(create.as_ref())).await.unwrap();

    assert_eq!(outcome, InboundOutcome::Acknowledged);
    assert_eq!(executor.pending_len(), 0);
    assert_eq!(executor.history_len(), 1);
    assert_eq!(map.read().area_count(), 1);
}

#[tokio::test]
async fn test_rejection_drops_pending_without_rollback() {
    let (map, executor, _emitter, sync) = synced();
    let create = Arc::new(CreateAreaCommand::new(map.clone(), area("hall")));
    executor.submit(create.clone()).await.unwrap();

    let outcome = sync
        .receive(EditMapCommandMessage::error(*create.id(), "not allowed"))
        .await
        .unwrap();
    assert_eq!(outcome, InboundOutcome::Rejected { removed: true });
    assert_eq!(executor.pending_len(), 0);
    assert_eq!(executor.history_len(), 1);
    assert_eq!(map.read().area_count(), 1);

    let outcome = sync
        .receive(EditMapCommandMessage::error(CommandId::new(), "unknown"))
        .await
        .unwrap();
    assert_eq!(outcome, InboundOutcome::Rejected { removed: false });
}

#[tokio::test]
async fn test_divergence_unwinds_pending_in_reverse_order() {
    let (map, executor, _emitter, sync) = synced();
    let log = ExecutionLog::default();

    drop(executor.submit(LogCommand::new("c1", &log)));
    drop(executor.submit(LogCommand::new("c2", &log)));
    executor.submit(LogCommand::new("c3", &log)).await.unwrap();
    assert_eq!(executor.pending_len(), 3);

    let message = remote(EditMapMessage::UpdateWamSetting {
        name: "silent".to_string(),
        value: Some(serde_json::json!(true)),
    });
    let outcome = sync.receive(message.clone()).await.unwrap();

    assert_eq!(outcome, InboundOutcome::Applied { reverted: 3 });
    assert_eq!(finished(&log)[3..], ["undo c3", "undo c2", "undo c1"]);
    assert_eq!(executor.history_len(), 0);
    assert_eq!(executor.pending_len(), 0);
    assert!(!executor.is_reverting());

    // The server's command was applied after the rollback
    assert_eq!(map.read().setting("silent"), Some(&serde_json::json!(true)));
    let last = message.id.to_string();
    assert_eq!(map.read().last_command_id(), Some(last.as_str()));
}

#[tokio::test]
async fn test_ack_then_divergence_scenario() {
    let (map, executor, _emitter, sync) = synced();

    let a1 = Arc::new(CreateAreaCommand::new(map.clone(), area("a1")));
    executor.submit(a1.clone()).await.unwrap();
    assert_eq!(executor.history_ids(), [*a1.id()]);
    assert_eq!(executor.pending_ids(), [*a1.id()]);

    assert_eq!(
        sync.receive(echo(a1.as_ref())).await.unwrap(),
        InboundOutcome::Acknowledged
    );
    assert_eq!(executor.pending_len(), 0);
    assert_eq!(executor.history_ids(), [*a1.id()]);

    let a2 = Arc::new(CreateAreaCommand::new(map.clone(), area("a2")));
    executor.submit(a2.clone()).await.unwrap();
    assert_eq!(executor.pending_ids(), [*a2.id()]);

    // Someone else's area got in first
    let outcome = sync
        .receive(remote(EditMapMessage::CreateArea(area("lobby"))))
        .await
        .unwrap();

    assert_eq!(outcome, InboundOutcome::Applied { reverted: 1 });
    assert_eq!(executor.pending_len(), 0);
    assert_eq!(executor.history_ids(), [*a1.id()]);
    let map = map.read();
    assert!(map.area(&AreaId::new("a1")).is_some());
    assert!(map.area(&AreaId::new("a2")).is_none());
    assert!(map.area(&AreaId::new("lobby")).is_some());
}

#[tokio::test]
async fn test_remote_commands_reach_their_tools() {
    let (map, executor, emitter, sync) = synced();

    let outcome = sync
        .receive(remote(EditMapMessage::ModifyFloor {
            tiles: vec![FloorTile::paint(1, 2, "grass")],
        }))
        .await
        .unwrap();
    assert_eq!(outcome, InboundOutcome::Applied { reverted: 0 });
    assert_eq!(map.read().tile(TileCoord::new(1, 2)), Some("grass"));

    // Updating an unknown area is logged and skipped
    sync.receive(remote(EditMapMessage::UpdateArea(area("ghost"))))
        .await
        .unwrap();
    assert_eq!(map.read().area_count(), 0);

    assert_eq!(executor.history_len(), 0);
    assert!(emitter.sent().is_empty());
}

#[tokio::test]
async fn test_empty_catch_up_changes_nothing() {
    let (map, executor, emitter, sync) = synced();

    assert_eq!(sync.update_map_to_newest(Vec::new()).await, 0);

    assert_eq!(map.read().last_command_id(), None);
    assert_eq!(executor.history_len(), 0);
    assert_eq!(executor.pending_len(), 0);
    assert!(emitter.sent().is_empty());
}

#[tokio::test]
async fn test_catch_up_applies_without_recording() {
    let (map, executor, emitter, sync) = synced();
    let missed = vec![
        remote(EditMapMessage::CreateArea(area("hall"))),
        remote(EditMapMessage::DeleteArea {
            id: AreaId::new("hall"),
        }),
        remote(EditMapMessage::CreateArea(area("garden"))),
    ];
    let last = missed[2].id.to_string();

    assert_eq!(sync.update_map_to_newest(missed).await, 3);

    assert!(map.read().area(&AreaId::new("hall")).is_none());
    assert!(map.read().area(&AreaId::new("garden")).is_some());
    assert_eq!(map.read().last_command_id(), Some(last.as_str()));
    assert_eq!(executor.history_len(), 0);
    assert_eq!(executor.pending_len(), 0);
    assert!(emitter.sent().is_empty());
}

#[tokio::test]
async fn test_room_connection_round_trip() {
    let (map, executor, _emitter, sync) = synced();
    let (connection, mut server) = RoomConnection::in_memory();
    let connection = Arc::new(connection);
    let _subscription = sync.subscribe_to_room_connection(&connection).unwrap();
    assert!(sync.subscribe_to_room_connection(&connection).is_err());

    // Acknowledged
    drop(executor.submit(Arc::new(CreateAreaCommand::new(map.clone(), area("hall")))));
    let sent = server.acknowledge_next().await.unwrap();
    assert_eq!(sent.message.kind(), "createArea");
    settle(&executor, 0).await;

    // Rejected
    drop(executor.submit(Arc::new(CreateAreaCommand::new(map.clone(), area("garden")))));
    server.reject_next("quota exceeded").await.unwrap();
    settle(&executor, 0).await;
    assert_eq!(executor.history_len(), 2);

    // Someone else's edit
    let message = remote(EditMapMessage::CreateArea(area("lobby")));
    server.send(&message).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while map.read().area_count() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("remote area never arrived");
    assert_eq!(executor.history_len(), 2);
}

#[tokio::test]
async fn test_inbound_messages_are_handled_one_at_a_time_in_order() {
    let (_map, executor, _emitter) = executor();
    let log = ExecutionLog::default();
    let tools = ToolRegistry::new(|name| {
        Arc::new(SlowTool {
            name,
            log: log.clone(),
        }) as Arc<dyn MapEditorTool>
    });
    let sync = SyncProtocol::new(executor, Arc::new(tools));

    let handles: Vec<_> = ["slow", "fast", "last"]
        .into_iter()
        .map(|label| sync.receive(setting(label)))
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), InboundOutcome::Applied { reverted: 0 });
    }

    let expected: Vec<String> = ["slow", "fast", "last"]
        .into_iter()
        .flat_map(|label| {
            EditorToolName::ALL.into_iter().flat_map(move |tool| {
                [format!("start {} {}", label, tool), format!("end {} {}", label, tool)]
            })
        })
        .collect();
    assert_eq!(*log.lock(), expected);
}

//! Integration tests for command execution, undo and redo.

mod common;

use std::sync::Arc;

use common::{area, executor, finished, wait_for_entry, ExecutionLog, LogCommand};
use void_map::AreaId;
use void_map_editor::commands::{CreateAreaCommand, DeleteAreaCommand, UpdateWamSettingCommand};
use void_map_editor::tools::AreaEditorTool;
use void_map_editor::Command;

#[tokio::test]
async fn test_commands_run_in_submission_order_without_overlap() {
    let (_map, executor, emitter) = executor();
    let log = ExecutionLog::default();

    let handles: Vec<_> = (0..10)
        .map(|i| executor.submit(LogCommand::new(&format!("c{}", i), &log)))
        .collect();
    // Await in reverse; order was fixed at submission
    for handle in handles.into_iter().rev() {
        handle.await.unwrap();
    }

    let expected: Vec<String> = (0..10)
        .flat_map(|i| [format!("start c{}", i), format!("end c{}", i)])
        .collect();
    assert_eq!(*log.lock(), expected);
    assert_eq!(emitter.sent().len(), 10);
}

#[tokio::test]
async fn test_undo_then_redo_restores_map() {
    let (map, executor, emitter) = executor();

    executor
        .submit(Arc::new(CreateAreaCommand::new(map.clone(), area("hall"))))
        .await
        .unwrap();
    let before = map.read().area(&AreaId::new("hall")).cloned();
    assert!(before.is_some());

    executor.undo().await.unwrap();
    assert_eq!(map.read().area_count(), 0);
    assert_eq!(executor.current_index(), -1);

    executor.redo().await.unwrap();
    assert_eq!(map.read().area(&AreaId::new("hall")).cloned(), before);
    assert_eq!(executor.current_index(), 0);
    assert_eq!(executor.history_len(), 1);

    assert_eq!(emitter.sent_kinds(), vec!["createArea", "deleteArea", "createArea"]);
    assert_eq!(executor.pending_len(), 3);
}

#[tokio::test]
async fn test_history_counts_after_commands_and_undos() {
    let (_map, executor, _emitter) = executor();
    let log = ExecutionLog::default();
    let (k, j) = (5, 2);

    for i in 0..k {
        drop(executor.submit(LogCommand::new(&format!("c{}", i), &log)));
    }
    for _ in 0..j {
        drop(executor.undo());
    }
    executor.submit_local(LogCommand::new("barrier", &log)).await.unwrap();

    assert_eq!(executor.history_len(), k);
    assert_eq!(executor.current_index(), (k - 1 - j) as isize);
    assert_eq!(executor.pending_len(), k + j);
    assert_eq!(
        finished(&log)[k..k + j],
        ["undo c4".to_string(), "undo c3".to_string()]
    );
}

#[tokio::test]
async fn test_new_command_discards_redo_branch() {
    let (_map, executor, _emitter) = executor();
    let log = ExecutionLog::default();

    let c1 = LogCommand::new("c1", &log);
    let c2 = LogCommand::new("c2", &log);
    let c3 = LogCommand::new("c3", &log);
    let c4 = LogCommand::new("c4", &log);
    let ids = [*c1.id(), *c2.id(), *c4.id()];

    drop(executor.submit(c1));
    drop(executor.submit(c2));
    drop(executor.submit(c3));
    drop(executor.undo());
    executor.submit(c4).await.unwrap();

    assert_eq!(executor.history_ids(), ids);
    assert_eq!(executor.current_index(), 2);
    assert!(!executor.with_ledger(|ledger| ledger.history.can_redo()));
}

#[tokio::test]
async fn test_settings_command_skips_history() {
    let (map, executor, emitter) = executor();
    let log = ExecutionLog::default();

    drop(executor.submit(LogCommand::new("c1", &log)));
    drop(executor.submit(LogCommand::new("c2", &log)));
    drop(executor.undo());
    executor
        .submit(Arc::new(UpdateWamSettingCommand::from_map(
            map.clone(),
            "megaphone",
            Some(serde_json::json!({ "enabled": true })),
        )))
        .await
        .unwrap();

    // Redo branch intact, setting shared and pending
    assert_eq!(executor.history_len(), 2);
    assert_eq!(executor.current_index(), 0);
    assert!(executor.with_ledger(|ledger| ledger.history.can_redo()));
    assert_eq!(executor.pending_len(), 4);
    assert_eq!(emitter.sent().last().map(|m| m.message.kind()), Some("updateWamSetting"));
    assert_eq!(
        map.read().setting("megaphone"),
        Some(&serde_json::json!({ "enabled": true }))
    );
}

#[tokio::test]
async fn test_failed_command_is_not_recorded() {
    let (map, executor, emitter) = executor();
    let log = ExecutionLog::default();

    drop(executor.submit(LogCommand::failing("broken", &log)));
    executor
        .submit(Arc::new(DeleteAreaCommand::new(map.clone(), area("missing"))))
        .await
        .unwrap();
    executor.submit(LogCommand::new("next", &log)).await.unwrap();

    assert_eq!(finished(&log), vec!["broken", "next"]);
    assert_eq!(executor.history_len(), 1);
    assert_eq!(executor.pending_len(), 1);
    assert_eq!(emitter.sent().len(), 1);
}

#[tokio::test]
async fn test_command_without_connection_is_applied_but_not_recorded() {
    let (map, executor, _emitter) = executor();
    executor.detach_emitter();

    executor
        .submit(Arc::new(CreateAreaCommand::new(map.clone(), area("hall"))))
        .await
        .unwrap();

    assert_eq!(map.read().area_count(), 1);
    assert_eq!(executor.history_len(), 0);
    assert_eq!(executor.pending_len(), 0);
    assert_eq!(map.read().last_command_id(), None);
}

#[tokio::test]
async fn test_failed_undo_evicts_history_entry() {
    let (map, executor, emitter) = executor();

    executor
        .submit(Arc::new(CreateAreaCommand::new(map.clone(), area("hall"))))
        .await
        .unwrap();
    // Someone else removed it behind our back
    map.write().delete_area(&AreaId::new("hall")).unwrap();

    executor.undo().await.unwrap();

    assert_eq!(executor.history_len(), 0);
    assert_eq!(executor.current_index(), -1);
    assert_eq!(emitter.sent().len(), 1);
}

#[tokio::test]
async fn test_local_command_updates_last_command_id_only() {
    let (map, executor, emitter) = executor();
    let command = Arc::new(CreateAreaCommand::new(map.clone(), area("hall")));
    let id = command.id().to_string();

    executor.submit_local(command).await.unwrap();

    assert_eq!(map.read().last_command_id(), Some(id.as_str()));
    assert_eq!(executor.history_len(), 0);
    assert_eq!(executor.pending_len(), 0);
    assert!(emitter.sent().is_empty());
}

#[tokio::test]
async fn test_undo_and_redo_at_history_edges_do_nothing() {
    let (_map, executor, emitter) = executor();

    executor.undo().await.unwrap();
    executor.redo().await.unwrap();

    assert_eq!(executor.history_len(), 0);
    assert_eq!(executor.pending_len(), 0);
    assert!(emitter.sent().is_empty());
}

#[tokio::test]
async fn test_failed_redo_evicts_entry_at_cursor() {
    let (map, executor, emitter) = executor();
    let first = Arc::new(CreateAreaCommand::new(map.clone(), area("first")));
    let second = Arc::new(CreateAreaCommand::new(map.clone(), area("second")));
    drop(executor.submit(first));
    drop(executor.submit(second.clone()));
    executor.undo().await.unwrap();
    assert_eq!(executor.current_index(), 0);

    // Recreated elsewhere, so redoing the creation fails
    map.write().add_area(area("second")).unwrap();
    executor.redo().await.unwrap();

    assert_eq!(executor.history_ids(), [*second.id()]);
    assert_eq!(executor.current_index(), -1);
    assert_eq!(emitter.sent_kinds(), vec!["createArea", "createArea", "deleteArea"]);
}

#[tokio::test]
async fn test_failed_redo_with_nothing_applied_evicts_first_entry() {
    let (map, executor, emitter) = executor();
    executor
        .submit(Arc::new(CreateAreaCommand::new(map.clone(), area("hall"))))
        .await
        .unwrap();
    executor.undo().await.unwrap();
    assert_eq!(executor.current_index(), -1);

    map.write().add_area(area("hall")).unwrap();
    executor.redo().await.unwrap();

    assert_eq!(executor.history_len(), 0);
    assert_eq!(executor.current_index(), -1);
    assert_eq!(emitter.sent().len(), 2);
}

#[tokio::test]
async fn test_command_submitted_during_rollback_waits_for_it() {
    let (_map, executor, _emitter) = executor();
    let log = ExecutionLog::default();
    drop(executor.submit(LogCommand::new("c1", &log)));
    executor.submit(LogCommand::new("c2", &log)).await.unwrap();

    let rollback = {
        let executor = executor.clone();
        tokio::spawn(async move { executor.revert_pending_commands().await })
    };
    wait_for_entry(&log, "start undo c2").await;
    assert!(executor.is_reverting());

    let late = executor.submit(LogCommand::new("c3", &log));
    assert_eq!(rollback.await.unwrap(), 2);
    late.await.unwrap();

    assert_eq!(finished(&log), vec!["c1", "c2", "undo c2", "undo c1", "c3"]);
    let log = log.lock();
    let unwound = log.iter().position(|e| e == "end undo c1").unwrap();
    let started = log.iter().position(|e| e == "start c3").unwrap();
    assert!(started > unwound);
    drop(log);

    assert_eq!(executor.history_len(), 1);
    assert_eq!(executor.pending_len(), 1);
}

#[tokio::test]
async fn test_queued_area_updates_undo_one_step_at_a_time() {
    let (map, executor, _emitter) = executor();
    let tool = AreaEditorTool::new(executor.clone(), map.clone());
    tool.create_area(area("hall")).await.unwrap();

    let moved_to = |x: f32| {
        let mut moved = area("hall");
        moved.x = x;
        moved
    };
    // Neither handle is awaited before the next edit is queued
    drop(tool.update_area(moved_to(10.0)));
    drop(tool.update_area(moved_to(20.0)));

    executor.undo().await.unwrap();
    let hall = AreaId::new("hall");
    assert_eq!(map.read().area(&hall).map(|a| a.x), Some(10.0));
    assert_eq!(executor.current_index(), 1);

    executor.undo().await.unwrap();
    assert_eq!(map.read().area(&hall).map(|a| a.x), Some(0.0));

    tool.delete_area(&hall).await.unwrap();
    executor.undo().await.unwrap();
    assert_eq!(map.read().area(&hall), Some(&area("hall")));
}

use std::path::PathBuf;

use tempo_client::{ClientError, ExecutionRef, FileProvider, MockProvider, WorkflowProvider};
use tempo_history::{GroupKind, HistorySnapshot};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[tokio::test]
async fn file_export_lists_and_reconstructs() {
    let provider = FileProvider::new(fixtures());
    let listed = provider.list_workflows("default", "").await.unwrap();
    assert_eq!(listed.len(), 1);
    let summary = &listed[0];
    assert_eq!(summary.workflow_id, "order-42");
    assert_eq!(summary.workflow_type, "OrderWorkflow");
    assert_eq!(summary.task_queue, "orders");
    assert_eq!(summary.status, "Completed");
    assert_eq!(summary.history_length, Some(11));

    let events = provider
        .fetch_history("default", &summary.execution())
        .await
        .unwrap();
    let snapshot = HistorySnapshot::build(events);
    let activity = snapshot
        .roots()
        .iter()
        .find(|r| r.kind == GroupKind::Activity)
        .unwrap();
    assert_eq!(activity.name, "Activity: ChargeCard");
    assert_eq!(activity.status, "Completed");
    assert_eq!(activity.attempt_count, 1);
    assert_eq!(activity.children.len(), 1);
}

#[tokio::test]
async fn file_export_query_filters_and_missing_ids() {
    let provider = FileProvider::new(fixtures());
    assert!(provider.list_workflows("default", "payment").await.unwrap().is_empty());
    assert_eq!(provider.list_workflows("default", "ORDERWORK").await.unwrap().len(), 1);

    let err = provider
        .fetch_history("default", &ExecutionRef::latest("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn file_export_is_read_only() {
    let provider = FileProvider::new(fixtures().join("order-42.json"));
    let exec = ExecutionRef::latest("order-42");
    assert!(provider.describe_workflow("default", &exec).await.is_ok());
    let err = provider.terminate("default", &exec, "no").await.unwrap_err();
    assert!(matches!(err, ClientError::Unsupported("terminate")));
    let err = provider.delete("default", &exec).await.unwrap_err();
    assert!(matches!(err, ClientError::Unsupported("delete")));
}

#[tokio::test]
async fn unreadable_exports_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(fixtures().join("order-42.json"), dir.path().join("good.json")).unwrap();
    std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let provider = FileProvider::new(dir.path());
    let listed = provider.list_workflows("default", "").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].workflow_id, "good");

    let err = provider
        .fetch_history("default", &ExecutionRef::latest("broken"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn mock_signal_shows_up_in_refetched_history() {
    let mock = MockProvider::new();
    let exec = ExecutionRef::latest("inventory-check-111");
    let before = mock.fetch_history("default", &exec).await.unwrap();
    mock.signal("default", &exec, "recount", Some(serde_json::json!({ "sku": "A1" })))
        .await
        .unwrap();
    let after = mock.fetch_history("default", &exec).await.unwrap();
    assert_eq!(after.len(), before.len() + 1);

    let snapshot = HistorySnapshot::build(after);
    let signals = snapshot
        .roots()
        .iter()
        .filter(|r| r.kind == GroupKind::Signal)
        .count();
    assert_eq!(signals, 1);
    assert!(snapshot.roots().iter().all(|r| r.events.len() + r.children.len() > 0));
}

#[tokio::test]
async fn mock_rejects_commands_on_closed_workflows() {
    let mock = MockProvider::new();
    let exec = ExecutionRef::latest("payment-xyz789");
    let err = mock.signal("default", &exec, "late", None).await.unwrap_err();
    assert!(matches!(err, ClientError::Http { status: 400, .. }));
    assert!(!err.is_fetch_failure());
}

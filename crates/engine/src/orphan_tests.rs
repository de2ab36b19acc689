use super::*;

use omx_adapters::session::FakeSessionAdapter;
use omx_core::{TaskStatus, WorkerIdentity};
use tempfile::TempDir;

fn store() -> (TempDir, StateStore) {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path());
    (dir, store)
}

fn team() -> TeamName {
    TeamName::parse("alpha").unwrap()
}

fn worker() -> WorkerName {
    WorkerName::parse("worker-1").unwrap()
}

fn write_identity(store: &StateStore, pane_id: &str) {
    let mut identity = WorkerIdentity::new(worker(), team(), 0, "implementer", "/repo", 100);
    identity.pane_id = Some(pane_id.to_string());
    let path = omx_storage::worker_identity_path(&store.state_root(), team().as_str(), worker().as_str()).unwrap();
    store.write_path(&path, &identity).unwrap();
}

#[tokio::test]
async fn flags_in_progress_task_whose_pane_died() {
    let (_dir, store) = store();
    write_identity(&store, "pane-1");

    let task = task_store::create_task(&store, &team(), "subject", "desc", vec![], 1_000).unwrap();
    task_store::claim_task(&store, &team(), &task.id, &worker(), 1_100).unwrap();

    let adapter = FakeSessionAdapter::new();
    adapter.add_session("pane-1", false);

    let orphans = detect_orphans(&store, &adapter, &team()).await.unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].task, task.id);
    assert_eq!(orphans[0].worker, worker());
}

#[tokio::test]
async fn live_pane_is_not_orphaned() {
    let (_dir, store) = store();
    write_identity(&store, "pane-1");

    let task = task_store::create_task(&store, &team(), "subject", "desc", vec![], 1_000).unwrap();
    task_store::claim_task(&store, &team(), &task.id, &worker(), 1_100).unwrap();

    let adapter = FakeSessionAdapter::new();
    adapter.add_session("pane-1", true);

    let orphans = detect_orphans(&store, &adapter, &team()).await.unwrap();
    assert!(orphans.is_empty());
}

#[tokio::test]
async fn non_in_progress_tasks_are_ignored() {
    let (_dir, store) = store();
    write_identity(&store, "pane-1");

    let task = task_store::create_task(&store, &team(), "subject", "desc", vec![], 1_000).unwrap();
    assert_eq!(task.status, TaskStatus::Pending);

    let adapter = FakeSessionAdapter::new();
    adapter.add_session("pane-1", false);

    let orphans = detect_orphans(&store, &adapter, &team()).await.unwrap();
    assert!(orphans.is_empty());
}

use super::*;

use omx_adapters::session::FakeSessionAdapter;
use tempfile::TempDir;

fn config(dir: &TempDir) -> WatcherConfig {
    WatcherConfig {
        project_root: dir.path().to_path_buf(),
        poll_interval: Duration::from_millis(50),
        log_retention_days: 7,
    }
}

#[tokio::test]
async fn tick_falls_back_to_default_config_when_hook_file_missing() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeSessionAdapter::new();

    let report = tick(&config(&dir), &adapter, 1_000).await;

    assert_eq!(report.dispatch.processed, 0);
    assert_eq!(report.dispatch.failed, 0);
}

#[tokio::test]
async fn tick_appends_a_daily_log_line() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeSessionAdapter::new();

    tick(&config(&dir), &adapter, 1_000).await;

    let logs = omx_storage::list_daily_logs(dir.path()).unwrap();
    assert_eq!(logs.len(), 1);
}

#[test]
fn sweep_logs_rotates_entries_older_than_the_cutoff_and_keeps_today() {
    let dir = TempDir::new().unwrap();
    let old_date = daily_log::format_date(0);
    let today = daily_log::format_date(30 * 86_400_000);

    omx_storage::append_daily_log(dir.path(), &old_date, &serde_json::json!({"kind": "old"})).unwrap();
    omx_storage::append_daily_log(dir.path(), &today, &serde_json::json!({"kind": "today"})).unwrap();

    sweep_logs(dir.path(), 7, 30 * 86_400_000);

    let logs = omx_storage::list_daily_logs(dir.path()).unwrap();
    assert_eq!(logs.len(), 1, "only today's plaintext log should remain");

    let archives: Vec<_> = std::fs::read_dir(omx_storage::omx_root(dir.path()).join("logs"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|ext| ext == "zst").unwrap_or(false))
        .collect();
    assert_eq!(archives.len(), 1, "the stale log should have been rotated into an archive");
}

use super::*;

use serde_json::json;
use tempfile::TempDir;

#[test]
fn format_date_matches_known_epoch_days() {
    assert_eq!(format_date(0), "1970-01-01");
    // 2024-01-01T00:00:00Z
    assert_eq!(format_date(1_704_067_200_000), "2024-01-01");
}

#[test]
fn append_daily_log_writes_under_project_logs_dir() {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path().to_path_buf());
    append_daily_log(&store, &json!({"event": "session_start"}), 1_704_067_200_000);
    let path = omx_storage::daily_log_path(dir.path(), "2024-01-01");
    let contents = std::fs::read_to_string(path).unwrap();
    assert!(contents.contains("session_start"));
}

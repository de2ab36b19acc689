use super::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Probe {
    value: u32,
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    store
        .write("ralph", &Scope::Global, &Probe { value: 7 })
        .unwrap();
    let read: Option<Probe> = store.read("ralph", &Scope::Global).unwrap();
    assert_eq!(read, Some(Probe { value: 7 }));
}

#[test]
fn read_missing_file_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let read: Option<Probe> = store.read("ralph", &Scope::Global).unwrap();
    assert_eq!(read, None);
}

#[test]
fn session_scope_is_isolated_from_global() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    store
        .write("team", &Scope::Global, &Probe { value: 1 })
        .unwrap();
    store
        .write(
            "team",
            &Scope::Session("sess-1".into()),
            &Probe { value: 2 },
        )
        .unwrap();

    let global: Option<Probe> = store.read("team", &Scope::Global).unwrap();
    let session: Option<Probe> = store.read("team", &Scope::Session("sess-1".into())).unwrap();
    assert_eq!(global, Some(Probe { value: 1 }));
    assert_eq!(session, Some(Probe { value: 2 }));
}

#[test]
fn list_scopes_finds_global_and_session_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    store
        .write("ralph", &Scope::Global, &Probe { value: 1 })
        .unwrap();
    store
        .write("ralph", &Scope::Session("s1".into()), &Probe { value: 2 })
        .unwrap();
    store
        .write("ralph", &Scope::Session("s2".into()), &Probe { value: 3 })
        .unwrap();

    let scopes = store.list_scopes("ralph").unwrap();
    assert_eq!(scopes.len(), 3);
}

#[test]
fn list_sessions_returns_sorted_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    store
        .write("ralph", &Scope::Session("zeta".into()), &Probe { value: 1 })
        .unwrap();
    store
        .write("ralph", &Scope::Session("alpha".into()), &Probe { value: 2 })
        .unwrap();

    let sessions = store.list_sessions().unwrap();
    assert_eq!(sessions, vec!["alpha".to_string(), "zeta".to_string()]);
}

#[test]
fn malformed_json_is_reported_not_panicked() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let path = paths::mode_state_path(&store.state_root(), "ralph").unwrap();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"{not json").unwrap();

    let err = store.read::<Probe>("ralph", &Scope::Global).unwrap_err();
    assert!(matches!(err, StateStoreError::Malformed { .. }));
}

#[test]
fn resolve_working_dir_rejects_nul_bytes() {
    let err = resolve_working_dir_impl("/tmp/foo\0bar", None).unwrap_err();
    assert!(matches!(err, StateStoreError::InvalidInput(_)));
}

#[test]
fn resolve_working_dir_enforces_allowlist() {
    let err = resolve_working_dir_impl("/etc/secrets", Some("/home/user:/srv/app")).unwrap_err();
    assert!(matches!(err, StateStoreError::OutsideAllowedRoots(_)));
}

#[test]
fn resolve_working_dir_allows_path_under_root() {
    let resolved = resolve_working_dir_impl("/home/user/proj", Some("/home/user:/srv/app")).unwrap();
    assert_eq!(resolved, PathBuf::from("/home/user/proj"));
}

#[test]
fn jsonl_append_and_read_round_trip_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let path = dir.path().join("events.jsonl");
    store.append_jsonl(&path, &Probe { value: 1 }).unwrap();
    store.append_jsonl(&path, &Probe { value: 2 }).unwrap();

    let records: Vec<Probe> = store.read_jsonl(&path).unwrap();
    assert_eq!(records, vec![Probe { value: 1 }, Probe { value: 2 }]);
}

#[test]
fn read_jsonl_missing_file_returns_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let records: Vec<Probe> = store.read_jsonl(&dir.path().join("missing.jsonl")).unwrap();
    assert!(records.is_empty());
}

#[test]
fn text_write_then_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let path = dir.path().join("inbox.md");
    store.write_text(&path, "# hello").unwrap();
    assert_eq!(store.read_text(&path).unwrap(), Some("# hello".to_string()));
}

#[test]
fn resolve_working_dir_trims_whitespace() {
    let resolved = resolve_working_dir_impl("  /tmp/proj  ", None).unwrap();
    assert_eq!(resolved, PathBuf::from("/tmp/proj"));
}

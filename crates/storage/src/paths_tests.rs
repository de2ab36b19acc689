use super::*;
use std::path::Path;

#[test]
fn rejects_dot_dot_in_kind() {
    assert!(matches!(validate_kind(".."), Err(PathError::PathTraversal(_))));
}

#[test]
fn rejects_separator_in_session_id() {
    assert!(matches!(
        validate_session_id("a/b"),
        Err(PathError::PathTraversal(_))
    ));
}

#[test]
fn accepts_plain_kind() {
    assert!(validate_kind("ralph").is_ok());
}

#[test]
fn mode_state_path_matches_layout() {
    let root = Path::new("/proj/.omx/state");
    let path = mode_state_path(root, "ralph").unwrap();
    assert_eq!(path, Path::new("/proj/.omx/state/ralph-state.json"));
}

#[test]
fn task_path_rejects_non_digit_id() {
    let root = Path::new("/proj/.omx/state");
    assert!(task_path(root, "payments", "abc").is_err());
}

#[test]
fn task_path_matches_layout() {
    let root = Path::new("/proj/.omx/state");
    let path = task_path(root, "payments", "42").unwrap();
    assert_eq!(
        path,
        Path::new("/proj/.omx/state/team/payments/tasks/task-42.json")
    );
}

#[test]
fn mailbox_path_matches_layout() {
    let root = Path::new("/proj/.omx/state");
    let path = mailbox_path(root, "payments", "worker-1").unwrap();
    assert_eq!(
        path,
        Path::new("/proj/.omx/state/team/payments/mailbox/worker-1.json")
    );
}

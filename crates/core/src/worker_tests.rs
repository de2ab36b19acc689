use super::*;

#[test]
fn parses_valid_worker_name() {
    let w = WorkerName::parse("worker-1").unwrap();
    assert_eq!(w.as_str(), "worker-1");
}

#[test]
fn leader_fixed_is_recognized() {
    let w = WorkerName::parse(LEADER_FIXED).unwrap();
    assert!(w.is_leader_fixed());
}

#[test]
fn ordinary_worker_is_not_leader_fixed() {
    let w = WorkerName::parse("worker-2").unwrap();
    assert!(!w.is_leader_fixed());
}

#[test]
fn rejects_over_64_chars() {
    let name = "a".repeat(65);
    assert!(WorkerName::parse(name).is_err());
}

#[test]
fn new_identity_starts_with_no_assigned_tasks() {
    let identity = WorkerIdentity::new(
        WorkerName::parse("worker-1").unwrap(),
        crate::team::TeamName::parse("alpha").unwrap(),
        1,
        "implementer",
        "/tmp/alpha/worker-1",
        1000,
    );
    assert!(identity.assigned_tasks.is_empty());
    assert!(identity.pane_id.is_none());
}

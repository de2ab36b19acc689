use super::*;
use crate::team::TeamName;
use std::collections::HashSet;

fn make_task() -> Task {
    Task::new(
        TaskId::new("1"),
        TeamName::parse("payments").unwrap(),
        "do the thing".to_string(),
        String::new(),
        Vec::new(),
        1000,
    )
}

fn no_deps() -> HashSet<TaskId> {
    HashSet::new()
}

#[test]
fn parse_accepts_digits_only() {
    assert!(TaskId::parse("0").is_ok());
    assert!(TaskId::parse("12345").is_ok());
}

#[test]
fn parse_rejects_non_digits() {
    assert!(TaskId::parse("-1").is_err());
    assert!(TaskId::parse("../x").is_err());
    assert!(TaskId::parse("").is_err());
    assert!(TaskId::parse("1".repeat(21)).is_err());
}

#[test]
fn new_with_dependencies_starts_blocked() {
    let task = Task::new(
        TaskId::new("2"),
        TeamName::parse("payments").unwrap(),
        "depends on 1".to_string(),
        String::new(),
        vec![TaskId::new("1")],
        1000,
    );
    assert_eq!(task.status, TaskStatus::Blocked);
}

#[test]
fn claim_from_pending_succeeds() {
    let mut task = make_task();
    let worker = WorkerName::parse("worker-1").unwrap();
    task.claim(worker.clone(), 2000, &no_deps()).unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.owner, Some(worker));
}

#[test]
fn claim_twice_fails() {
    let mut task = make_task();
    let worker = WorkerName::parse("worker-1").unwrap();
    task.claim(worker.clone(), 2000, &no_deps()).unwrap();
    let err = task.claim(worker, 2100, &no_deps()).unwrap_err();
    assert!(matches!(err, TaskTransitionError::NotClaimable(_, TaskStatus::InProgress)));
}

#[test]
fn claim_with_unsatisfied_dependency_fails() {
    let mut task = Task::new(
        TaskId::new("2"),
        TeamName::parse("payments").unwrap(),
        "depends on 1".to_string(),
        String::new(),
        vec![TaskId::new("1")],
        1000,
    );
    let worker = WorkerName::parse("worker-1").unwrap();
    let err = task.claim(worker, 2000, &no_deps()).unwrap_err();
    assert!(matches!(err, TaskTransitionError::NotClaimable(_, TaskStatus::Blocked)));
}

#[test]
fn claim_with_satisfied_dependency_succeeds() {
    let mut task = Task::new(
        TaskId::new("2"),
        TeamName::parse("payments").unwrap(),
        "depends on 1".to_string(),
        String::new(),
        vec![TaskId::new("1")],
        1000,
    );
    let worker = WorkerName::parse("worker-1").unwrap();
    let mut completed = HashSet::new();
    completed.insert(TaskId::new("1"));
    task.claim(worker, 2000, &completed).unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
}

#[test]
fn complete_by_non_owner_fails() {
    let mut task = make_task();
    let owner = WorkerName::parse("worker-1").unwrap();
    let intruder = WorkerName::parse("worker-2").unwrap();
    task.claim(owner, 2000, &no_deps()).unwrap();
    let err = task.complete(&intruder, 3000, None).unwrap_err();
    assert!(matches!(err, TaskTransitionError::NotOwner(_, _, _)));
}

#[test]
fn complete_by_owner_succeeds_and_is_immutable() {
    let mut task = make_task();
    let owner = WorkerName::parse("worker-1").unwrap();
    task.claim(owner.clone(), 2000, &no_deps()).unwrap();
    task.complete(&owner, 3000, Some("done".to_string())).unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.result.as_deref(), Some("done"));

    let err = task.fail(&owner, 4000, "too late".to_string()).unwrap_err();
    assert!(matches!(err, TaskTransitionError::Terminal(_, TaskStatus::Completed)));
}

#[test]
fn fail_records_reason() {
    let mut task = make_task();
    let owner = WorkerName::parse("worker-1").unwrap();
    task.claim(owner.clone(), 2000, &no_deps()).unwrap();
    task.fail(&owner, 3000, "boom".to_string()).unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.failure_reason.as_deref(), Some("boom"));
}

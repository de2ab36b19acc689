// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task CRUD, atomic claim, and dependency-aware selection (§4.3).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use omx_core::{ApprovalDecision, Task, TaskId, TaskStatus, TeamEvent, TeamName, WorkerName};
use omx_storage::{with_file_lock, StateStore};

use crate::error::EngineError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskCounter {
    #[serde(default)]
    next: u64,
}

/// Allocate the next task id for `team`, under the team's counter file
/// lock. The counter file itself is read-modify-written inside the lock
/// so concurrent `create_task` calls from different processes never hand
/// out the same id.
fn next_task_id(store: &StateStore, team: &TeamName) -> Result<TaskId, EngineError> {
    let path = omx_storage::task_counter_path(&store.state_root(), team.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    let id = with_file_lock(&path, || {
        let mut counter: TaskCounter = std::fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default();
        let id = counter.next;
        counter.next += 1;
        let bytes = serde_json::to_vec_pretty(&counter)?;
        std::fs::write(&path, bytes)?;
        Ok(id)
    })
    .map_err(|e| EngineError::MalformedState(e.to_string()))?;
    TaskId::parse(id.to_string()).map_err(|e| EngineError::InvalidInput(e.to_string()))
}

fn task_path(store: &StateStore, team: &TeamName, id: &TaskId) -> Result<std::path::PathBuf, EngineError> {
    omx_storage::task_path(&store.state_root(), team.as_str(), id.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))
}

/// Create a new task, defaulting status to `blocked` when `blocked_by` is
/// non-empty and `pending` otherwise (§3).
pub fn create_task(
    store: &StateStore,
    team: &TeamName,
    subject: impl Into<String>,
    description: impl Into<String>,
    blocked_by: Vec<TaskId>,
    now_ms: u64,
) -> Result<Task, EngineError> {
    let id = next_task_id(store, team)?;
    let task = Task::new(id, team.clone(), subject.into(), description.into(), blocked_by, now_ms);
    let path = task_path(store, team, &task.id)?;
    store.write_path(&path, &task)?;
    Ok(task)
}

pub fn read_task(store: &StateStore, team: &TeamName, id: &TaskId) -> Result<Option<Task>, EngineError> {
    let path = task_path(store, team, id)?;
    Ok(store.read_path(&path)?)
}

/// List every task file under the team's `tasks/` directory.
pub fn list_tasks(store: &StateStore, team: &TeamName) -> Result<Vec<Task>, EngineError> {
    let dir = omx_storage::tasks_dir(&store.state_root(), team.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut tasks = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(|e| EngineError::MalformedState(e.to_string()))? {
        let entry = entry.map_err(|e| EngineError::MalformedState(e.to_string()))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(task) = store.read_path::<Task>(&path)? {
            tasks.push(task);
        }
    }
    tasks.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    Ok(tasks)
}

fn completed_ids(tasks: &[Task]) -> HashSet<TaskId> {
    tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .map(|t| t.id.clone())
        .collect()
}

/// Atomically claim a task for `worker` (§4.3). Takes a per-task advisory
/// lock so two concurrent claimants on the same id never both succeed.
pub fn claim_task(
    store: &StateStore,
    team: &TeamName,
    id: &TaskId,
    worker: &WorkerName,
    now_ms: u64,
) -> Result<Task, EngineError> {
    let path = task_path(store, team, id)?;
    let all_tasks = list_tasks(store, team)?;
    let completed = completed_ids(&all_tasks);

    with_file_lock(&path, || {
        let mut task: Task = match store.read_path(&path) {
            Ok(Some(t)) => t,
            Ok(None) => {
                return Err(std::io::Error::other("task not found"));
            }
            Err(e) => return Err(std::io::Error::other(e.to_string())),
        };
        task.claim(worker.clone(), now_ms, &completed)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        store
            .write_path(&path, &task)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(task)
    })
    .map_err(|e| EngineError::NotClaimable(e.to_string()))
}

/// Update a claimed task's status to `completed` or `failed`, appending the
/// matching [`TeamEvent`] on success (§4.3).
pub fn update_status(
    store: &StateStore,
    team: &TeamName,
    id: &TaskId,
    worker: &WorkerName,
    new_status: TaskStatus,
    result_or_reason: Option<String>,
    now_ms: u64,
) -> Result<Task, EngineError> {
    let path = task_path(store, team, id)?;
    let task = with_file_lock(&path, || {
        let mut task: Task = match store.read_path(&path) {
            Ok(Some(t)) => t,
            Ok(None) => return Err(std::io::Error::other("task not found")),
            Err(e) => return Err(std::io::Error::other(e.to_string())),
        };
        match new_status {
            TaskStatus::Completed => task
                .complete(worker, now_ms, result_or_reason.clone())
                .map_err(|e| std::io::Error::other(e.to_string()))?,
            TaskStatus::Failed => task
                .fail(worker, now_ms, result_or_reason.clone().unwrap_or_default())
                .map_err(|e| std::io::Error::other(e.to_string()))?,
            _ => return Err(std::io::Error::other("invalid_transition: only completed/failed allowed")),
        }
        store
            .write_path(&path, &task)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(task)
    })
    .map_err(|e| EngineError::InvalidTransition(e.to_string()))?;

    let event = match new_status {
        TaskStatus::Completed => TeamEvent::TaskCompleted {
            task: id.clone(),
            worker: worker.clone(),
            at_ms: now_ms,
        },
        _ => TeamEvent::TaskFailed {
            task: id.clone(),
            worker: worker.clone(),
            reason: result_or_reason.unwrap_or_default(),
            at_ms: now_ms,
        },
    };
    append_event(store, team, &event)?;
    Ok(task)
}

fn append_event(store: &StateStore, team: &TeamName, event: &TeamEvent) -> Result<(), EngineError> {
    let path = omx_storage::team_events_path(&store.state_root(), team.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    store.append_jsonl(&path, event)?;
    Ok(())
}

/// Select the next claimable task for `worker`: among tasks owned by
/// `worker` or unowned with satisfied dependencies, the smallest pending
/// id (§4.3).
pub fn next_claimable_task(
    store: &StateStore,
    team: &TeamName,
    worker: &WorkerName,
) -> Result<Option<Task>, EngineError> {
    let tasks = list_tasks(store, team)?;
    let completed = completed_ids(&tasks);
    let mut candidates: Vec<Task> = tasks
        .into_iter()
        .filter(|t| {
            t.status == TaskStatus::Pending
                && (t.owner.as_ref() == Some(worker) || t.owner.is_none())
                && t.dependencies_satisfied(&completed)
        })
        .collect();
    candidates.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    Ok(candidates.into_iter().next())
}

fn approval_path(store: &StateStore, team: &TeamName, id: &TaskId) -> Result<std::path::PathBuf, EngineError> {
    let mut path = task_path(store, team, id)?;
    path.set_extension("approval.json");
    Ok(path)
}

pub fn write_approval(
    store: &StateStore,
    team: &TeamName,
    decision: &ApprovalDecision,
) -> Result<(), EngineError> {
    let path = approval_path(store, team, &decision.task)?;
    store.write_path(&path, decision)?;
    append_event(
        store,
        team,
        &TeamEvent::ApprovalDecision {
            task: decision.task.clone(),
            approved: decision.approved,
            at_ms: decision.decided_at_ms,
        },
    )
}

pub fn read_approval(
    store: &StateStore,
    team: &TeamName,
    id: &TaskId,
) -> Result<Option<ApprovalDecision>, EngineError> {
    let path = approval_path(store, team, id)?;
    Ok(store.read_path(&path)?)
}

#[cfg(test)]
#[path = "task_store_tests.rs"]
mod tests;

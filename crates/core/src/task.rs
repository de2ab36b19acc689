// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identifier, status, and the closed set of legal status transitions.
//!
//! `pending`/`blocked` → `in_progress` only through [`Task::claim`].
//! `in_progress` → `{completed, failed}` only by the worker that holds the
//! claim. `completed` and `failed` are terminal and immutable.

use serde::{Deserialize, Serialize};

use crate::worker::WorkerName;

crate::define_id! {
    /// Unique identifier for a task: the decimal string of a monotonically
    /// increasing per-team counter. Must match `^\d{1,20}$`.
    pub struct TaskId;
}

/// Error returned when a task id fails the `^\d{1,20}$` wire shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("task id '{0}' must match ^\\d{{1,20}}$")]
pub struct TaskIdError(pub String);

impl TaskId {
    /// Parse a task id string against the `^\d{1,20}$` contract (§3, §8
    /// boundary behaviors: `"0"` accepted, `"-1"` and `"../x"` rejected).
    pub fn parse(s: impl Into<String>) -> Result<Self, TaskIdError> {
        let s = s.into();
        if s.is_empty() || s.len() > 20 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TaskIdError(s));
        }
        Ok(Self(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Blocked,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn is_claimable(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Blocked)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Blocked => "blocked",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A unit of work assigned to a team and, once claimed, to a single worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub team: crate::team::TeamName,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<WorkerName>,
    /// Ids that must reach `completed` before this task is claimable
    /// (§4.3: `claim_task` checks every id in `blocked_by`).
    #[serde(default)]
    pub blocked_by: Vec<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at_ms: u64,
}

/// Error returned when a caller attempts a transition [`Task`] forbids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskTransitionError {
    #[error("task {0} is not claimable from status {1}")]
    NotClaimable(TaskId, TaskStatus),
    #[error("task {0} is owned by {1:?}, not {2}")]
    NotOwner(TaskId, Option<WorkerName>, WorkerName),
    #[error("task {0} is terminal ({1}) and cannot be mutated")]
    Terminal(TaskId, TaskStatus),
}

impl Task {
    pub fn new(
        id: TaskId,
        team: crate::team::TeamName,
        subject: String,
        description: String,
        blocked_by: Vec<TaskId>,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id,
            team,
            subject,
            description,
            status: if blocked_by.is_empty() {
                TaskStatus::Pending
            } else {
                TaskStatus::Blocked
            },
            owner: None,
            blocked_by,
            claimed_at_ms: None,
            finished_at_ms: None,
            result: None,
            failure_reason: None,
            created_at_ms,
        }
    }

    /// Whether every id in `blocked_by` is `completed` in `completed_ids`.
    pub fn dependencies_satisfied(&self, completed_ids: &std::collections::HashSet<TaskId>) -> bool {
        self.blocked_by.iter().all(|dep| completed_ids.contains(dep))
    }

    /// Atomically claim the task for `worker`. Only legal from `pending` or
    /// `blocked`, and only once every `blocked_by` id is completed.
    pub fn claim(
        &mut self,
        worker: WorkerName,
        at_ms: u64,
        completed_ids: &std::collections::HashSet<TaskId>,
    ) -> Result<(), TaskTransitionError> {
        if !self.status.is_claimable() || !self.dependencies_satisfied(completed_ids) {
            return Err(TaskTransitionError::NotClaimable(self.id.clone(), self.status));
        }
        self.status = TaskStatus::InProgress;
        self.owner = Some(worker);
        self.claimed_at_ms = Some(at_ms);
        Ok(())
    }

    /// Mark the task completed. Only legal for the owning worker while
    /// `in_progress`.
    pub fn complete(
        &mut self,
        worker: &WorkerName,
        at_ms: u64,
        result: Option<String>,
    ) -> Result<(), TaskTransitionError> {
        self.finish(TaskStatus::Completed, worker, at_ms, result, None)
    }

    /// Mark the task failed. Only legal for the owning worker while
    /// `in_progress`.
    pub fn fail(
        &mut self,
        worker: &WorkerName,
        at_ms: u64,
        reason: String,
    ) -> Result<(), TaskTransitionError> {
        self.finish(TaskStatus::Failed, worker, at_ms, None, Some(reason))
    }

    fn finish(
        &mut self,
        to: TaskStatus,
        worker: &WorkerName,
        at_ms: u64,
        result: Option<String>,
        reason: Option<String>,
    ) -> Result<(), TaskTransitionError> {
        if self.status.is_terminal() {
            return Err(TaskTransitionError::Terminal(self.id.clone(), self.status));
        }
        if self.status != TaskStatus::InProgress {
            return Err(TaskTransitionError::NotClaimable(self.id.clone(), self.status));
        }
        if self.owner.as_ref() != Some(worker) {
            return Err(TaskTransitionError::NotOwner(
                self.id.clone(),
                self.owner.clone(),
                worker.clone(),
            ));
        }
        self.status = to;
        self.finished_at_ms = Some(at_ms);
        self.result = result;
        self.failure_reason = reason;
        Ok(())
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path validation and state tree layout (bit-exact with the external
//! interface contract: other tools read these paths directly).

use std::path::{Path, PathBuf};

use thiserror::Error;

use omx_core::{Classify, ErrorKind};

#[derive(Debug, Error)]
pub enum PathError {
    #[error("path traversal rejected: {0}")]
    PathTraversal(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("working dir outside allowed roots: {0}")]
    OutsideAllowedRoots(String),
}

impl Classify for PathError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// `kind`/`session_id` tokens must match `^[A-Za-z0-9_-]+$` and must not
/// contain `..` or path separators.
fn validate_token(token: &str) -> Result<(), PathError> {
    if token.is_empty() {
        return Err(PathError::InvalidInput("token must not be empty".into()));
    }
    if token.contains("..") || token.contains('/') || token.contains('\\') {
        return Err(PathError::PathTraversal(token.to_string()));
    }
    if !token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(PathError::InvalidInput(format!(
            "token '{token}' contains disallowed characters"
        )));
    }
    Ok(())
}

pub fn validate_kind(kind: &str) -> Result<(), PathError> {
    validate_token(kind)
}

pub fn validate_session_id(session_id: &str) -> Result<(), PathError> {
    validate_token(session_id)
}

/// The root of the state tree for a project: `<project>/.omx/state`.
pub fn state_root(project_root: &Path) -> PathBuf {
    project_root.join(".omx").join("state")
}

/// The root of the ambient (non-state) tree: `<project>/.omx`.
pub fn omx_root(project_root: &Path) -> PathBuf {
    project_root.join(".omx")
}

pub fn session_pointer_path(state_root: &Path) -> PathBuf {
    state_root.join("session.json")
}

pub fn session_history_path(state_root: &Path) -> PathBuf {
    state_root.join("session-history.jsonl")
}

/// Global mode state file: `<root>/<mode>-state.json`.
pub fn mode_state_path(state_root: &Path, mode: &str) -> Result<PathBuf, PathError> {
    validate_kind(mode)?;
    Ok(state_root.join(format!("{mode}-state.json")))
}

/// Session-scoped mode state file: `<root>/sessions/<sid>/<mode>-state.json`.
pub fn session_mode_state_path(
    state_root: &Path,
    session_id: &str,
    mode: &str,
) -> Result<PathBuf, PathError> {
    validate_session_id(session_id)?;
    validate_kind(mode)?;
    Ok(sessions_dir(state_root)
        .join(session_id)
        .join(format!("{mode}-state.json")))
}

pub fn sessions_dir(state_root: &Path) -> PathBuf {
    state_root.join("sessions")
}

pub fn session_metrics_path(state_root: &Path, session_id: &str) -> Result<PathBuf, PathError> {
    validate_session_id(session_id)?;
    Ok(sessions_dir(state_root).join(session_id).join("metrics.json"))
}

pub fn session_hud_state_path(state_root: &Path, session_id: &str) -> Result<PathBuf, PathError> {
    validate_session_id(session_id)?;
    Ok(sessions_dir(state_root).join(session_id).join("hud-state.json"))
}

pub fn tmux_hook_state_path(state_root: &Path) -> PathBuf {
    state_root.join("tmux-hook-state.json")
}

pub fn tmux_hook_config_path(project_root: &Path) -> PathBuf {
    omx_root(project_root).join("tmux-hook.json")
}

pub fn teams_dir(state_root: &Path) -> PathBuf {
    state_root.join("team")
}

pub fn team_dir(state_root: &Path, team: &str) -> Result<PathBuf, PathError> {
    validate_token(team)?;
    Ok(teams_dir(state_root).join(team))
}

pub fn team_config_path(state_root: &Path, team: &str) -> Result<PathBuf, PathError> {
    Ok(team_dir(state_root, team)?.join("config.json"))
}

pub fn team_phase_state_path(state_root: &Path, team: &str) -> Result<PathBuf, PathError> {
    Ok(team_dir(state_root, team)?.join("phase-state.json"))
}

pub fn task_path(state_root: &Path, team: &str, task_id: &str) -> Result<PathBuf, PathError> {
    if !task_id.chars().all(|c| c.is_ascii_digit()) || task_id.is_empty() || task_id.len() > 20 {
        return Err(PathError::InvalidInput(format!(
            "task id '{task_id}' must match ^\\d{{1,20}}$"
        )));
    }
    Ok(team_dir(state_root, team)?
        .join("tasks")
        .join(format!("task-{task_id}.json")))
}

pub fn tasks_dir(state_root: &Path, team: &str) -> Result<PathBuf, PathError> {
    Ok(team_dir(state_root, team)?.join("tasks"))
}

/// Per-team monotonic task id counter, read-modify-written under
/// [`crate::with_file_lock`].
pub fn task_counter_path(state_root: &Path, team: &str) -> Result<PathBuf, PathError> {
    Ok(team_dir(state_root, team)?.join("task-counter.json"))
}

pub fn worker_dir(state_root: &Path, team: &str, worker: &str) -> Result<PathBuf, PathError> {
    validate_token(worker)?;
    Ok(team_dir(state_root, team)?.join("workers").join(worker))
}

pub fn worker_identity_path(
    state_root: &Path,
    team: &str,
    worker: &str,
) -> Result<PathBuf, PathError> {
    Ok(worker_dir(state_root, team, worker)?.join("identity.json"))
}

pub fn worker_status_path(
    state_root: &Path,
    team: &str,
    worker: &str,
) -> Result<PathBuf, PathError> {
    Ok(worker_dir(state_root, team, worker)?.join("status.json"))
}

pub fn worker_heartbeat_path(
    state_root: &Path,
    team: &str,
    worker: &str,
) -> Result<PathBuf, PathError> {
    Ok(worker_dir(state_root, team, worker)?.join("heartbeat.json"))
}

pub fn worker_inbox_path(state_root: &Path, team: &str, worker: &str) -> Result<PathBuf, PathError> {
    Ok(worker_dir(state_root, team, worker)?.join("inbox.md"))
}

pub fn worker_shutdown_ack_path(
    state_root: &Path,
    team: &str,
    worker: &str,
) -> Result<PathBuf, PathError> {
    Ok(worker_dir(state_root, team, worker)?.join("shutdown-ack.json"))
}

pub fn mailbox_dir(state_root: &Path, team: &str) -> Result<PathBuf, PathError> {
    Ok(team_dir(state_root, team)?.join("mailbox"))
}

pub fn mailbox_path(state_root: &Path, team: &str, worker: &str) -> Result<PathBuf, PathError> {
    validate_token(worker)?;
    Ok(mailbox_dir(state_root, team)?.join(format!("{worker}.json")))
}

pub fn dispatch_dir(state_root: &Path, team: &str) -> Result<PathBuf, PathError> {
    Ok(team_dir(state_root, team)?.join("dispatch"))
}

pub fn dispatch_request_path(
    state_root: &Path,
    team: &str,
    request_id: &str,
) -> Result<PathBuf, PathError> {
    validate_token(request_id)?;
    Ok(dispatch_dir(state_root, team)?.join(format!("{request_id}.json")))
}

pub fn team_events_path(state_root: &Path, team: &str) -> Result<PathBuf, PathError> {
    Ok(team_dir(state_root, team)?.join("events.jsonl"))
}

/// Cooldown bookkeeping for `team_leader_nudge` events (§10.5 of the
/// expanded spec): last-nudge timestamp, separate from `events.jsonl` so
/// computing "is a nudge due" never requires scanning the whole log.
pub fn leader_nudge_state_path(state_root: &Path, team: &str) -> Result<PathBuf, PathError> {
    Ok(team_dir(state_root, team)?.join("leader-nudge-state.json"))
}

pub fn daily_log_path(project_root: &Path, date: &str) -> PathBuf {
    omx_root(project_root).join("logs").join(format!("omx-{date}.jsonl"))
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;

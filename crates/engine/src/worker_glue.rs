// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pane lifecycle: spawn argv, the AGENTS.md overlay, the initial
//! inbox, the trigger dispatch, readiness/liveness polling, and the
//! shutdown handshake (§4.8).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use omx_adapters::session::{PaneInfo, SessionAdapter};
use omx_core::{MessageId, RequestId, TeamName, WorkerIdentity, WorkerName};
use omx_storage::StateStore;

use crate::error::EngineError;
use crate::messaging;

/// Inputs to [`build_launch_argv`]: the model precedence chain and the
/// pass-through flags collected from the worker's launch contract.
#[derive(Debug, Clone, Default)]
pub struct LaunchArgvInput {
    pub env_model: Option<String>,
    pub inherited_model: Option<String>,
    pub fallback_model: String,
    pub bypass_permissions: bool,
    pub reasoning_effort: Option<String>,
    pub base_argv: Vec<String>,
}

/// `env model > inherited model > fallback` (§4.8).
fn resolve_model(input: &LaunchArgvInput) -> String {
    input
        .env_model
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| input.inherited_model.clone().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| input.fallback_model.clone())
}

/// Build the launch argv for a worker pane: `base_argv` with any
/// pre-existing `--model`/`-m` pair stripped, then a single canonical
/// `--model <name>` appended, and the bypass/reasoning-effort flags passed
/// through at most once regardless of how many times they appear (or how
/// many carry empty values) in `base_argv`.
pub fn build_launch_argv(input: &LaunchArgvInput) -> Vec<String> {
    let model = resolve_model(input);
    let mut argv = Vec::with_capacity(input.base_argv.len() + 4);
    let mut i = 0;
    while i < input.base_argv.len() {
        let arg = &input.base_argv[i];
        if arg == "--model" || arg == "-m" {
            i += 2;
            continue;
        }
        if arg.starts_with("--model=") {
            i += 1;
            continue;
        }
        if arg == "--dangerously-bypass-approvals-and-sandbox" || arg == "--reasoning-effort" {
            if arg == "--reasoning-effort" {
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }
        if arg.strip_prefix("--reasoning-effort=").is_some() {
            i += 1;
            continue;
        }
        argv.push(arg.clone());
        i += 1;
    }

    argv.push("--model".to_string());
    argv.push(model);

    if input.bypass_permissions {
        argv.push("--dangerously-bypass-approvals-and-sandbox".to_string());
    }
    if let Some(effort) = input.reasoning_effort.as_ref().filter(|s| !s.is_empty()) {
        argv.push("--reasoning-effort".to_string());
        argv.push(effort.clone());
    }

    argv
}

/// `OMX_TEAM_WORKER=<team>/<worker>`, set on every spawned worker pane so
/// the adapters crate's env accessors can identify a worker process (§4.6,
/// §4.8).
pub fn team_worker_env(team: &TeamName, worker: &WorkerName) -> (String, String) {
    ("OMX_TEAM_WORKER".to_string(), format!("{}/{}", team.as_str(), worker.as_str()))
}

const OVERLAY_START: &str = "<!-- OMX:TEAM:WORKER:START -->";
const OVERLAY_END: &str = "<!-- OMX:TEAM:WORKER:END -->";

fn overlay_block(team: &TeamName, worker: &WorkerName) -> String {
    format!(
        "{OVERLAY_START}\n\
You are worker `{worker}` on team `{team}`. Read `inbox.md` in your worker \
directory for your current instructions and follow the worker protocol: \
claim a task, do the work, report completion through the task store, and \
wait for your next inbox write.\n\
{OVERLAY_END}\n",
        team = team.as_str(),
        worker = worker.as_str(),
    )
}

/// Remove a previously-applied overlay block, if present, leaving the rest
/// of `content` untouched.
pub fn strip_worker_overlay(content: &str) -> String {
    let Some(start) = content.find(OVERLAY_START) else {
        return content.to_string();
    };
    let Some(end_rel) = content[start..].find(OVERLAY_END) else {
        return content.to_string();
    };
    let end = start + end_rel + OVERLAY_END.len();
    let mut stripped = String::with_capacity(content.len());
    stripped.push_str(&content[..start]);
    stripped.push_str(content[end..].trim_start_matches('\n'));
    stripped
}

/// Idempotently apply the worker overlay block to `content`: strip any
/// existing block first so repeated calls never duplicate it
/// (`applyWorkerOverlay(stripWorkerOverlay(x)) == applyWorkerOverlay(x)`,
/// §8).
pub fn apply_worker_overlay(content: &str, team: &TeamName, worker: &WorkerName) -> String {
    let base = strip_worker_overlay(content);
    let mut out = base;
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&overlay_block(team, worker));
    out
}

/// Render the initial `inbox.md` content for a freshly spawned worker:
/// identity, assigned tasks, and the protocol steps (§4.8).
pub fn render_initial_inbox(identity: &WorkerIdentity) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Worker: {}\n\n", identity.name.as_str()));
    out.push_str(&format!("Team: {}\n", identity.team.as_str()));
    out.push_str(&format!("Role: {}\n", identity.role));
    out.push_str(&format!("Working directory: {}\n\n", identity.working_dir));

    out.push_str("## Assigned tasks\n\n");
    if identity.assigned_tasks.is_empty() {
        out.push_str("(none yet — wait for the leader to assign work)\n\n");
    } else {
        for task in &identity.assigned_tasks {
            out.push_str(&format!("- {}\n", task.as_str()));
        }
        out.push('\n');
    }

    out.push_str(
        "## Protocol\n\n\
1. Claim the next assigned task that is not already in progress.\n\
2. Do the work for that task.\n\
3. Report completion or failure through the task store.\n\
4. Wait for this file to be replaced with your next assignment.\n",
    );
    out
}

fn inbox_trigger_message(worker: &WorkerName) -> String {
    format!("check your inbox, {}", worker.as_str())
}

/// Replace `inbox.md` with `render_initial_inbox`'s output, then queue and
/// attempt an inbox-kind dispatch to nudge the worker pane (§4.8).
#[allow(clippy::too_many_arguments)]
pub fn write_initial_inbox_and_trigger(
    store: &StateStore,
    team: &TeamName,
    identity: &WorkerIdentity,
    worker_index: u32,
    inbox_generation: u64,
    next_request_id: impl FnOnce() -> RequestId,
    now_ms: u64,
) -> Result<omx_core::DispatchRequest, EngineError> {
    let content = render_initial_inbox(identity);
    messaging::replace_inbox(store, team, &identity.name, &content)?;

    let trigger = inbox_trigger_message(&identity.name);
    omx_core::validate_trigger_message(&trigger).map_err(|e| EngineError::InvalidInput(e.to_string()))?;

    let dedupe_key = format!("{}:{}", identity.name.as_str(), inbox_generation);
    messaging::enqueue_inbox_dispatch(store, team, &identity.name, worker_index, dedupe_key, trigger, next_request_id, now_ms)
}

/// Poll for pane existence up to a bounded number of attempts, sleeping
/// `poll_interval` between attempts (§4.8). `poll_interval` of zero makes
/// this a tight synchronous loop, useful in tests.
pub async fn wait_for_worker_ready<A: SessionAdapter>(
    adapter: &A,
    pane_id: &str,
    max_attempts: usize,
    poll_interval: Duration,
) -> Result<bool, EngineError> {
    for attempt in 0..max_attempts.max(1) {
        if adapter
            .is_alive(pane_id)
            .await
            .map_err(|e| EngineError::TmuxUnavailable(e.to_string()))?
        {
            return Ok(true);
        }
        if attempt + 1 < max_attempts && !poll_interval.is_zero() {
            tokio::time::sleep(poll_interval).await;
        }
    }
    Ok(false)
}

/// Pane existence only — deliberately does *not* require the pane's
/// current command to equal the host CLI's binary name, since the host
/// CLI may be reported under a wrapper process name (§4.8).
pub async fn is_worker_alive<A: SessionAdapter>(adapter: &A, pane_id: &str) -> Result<bool, EngineError> {
    adapter.is_alive(pane_id).await.map_err(|e| EngineError::TmuxUnavailable(e.to_string()))
}

/// The outcome a worker writes to `shutdown-ack.json` in response to a
/// shutdown inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownStatus {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownAck {
    pub status: ShutdownStatus,
    pub at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

fn render_shutdown_inbox() -> String {
    "# Shutdown requested\n\n\
The leader has requested that you stop. Finish or hand back any task you \
currently hold, then write `shutdown-ack.json` in your worker directory \
with `status: \"accept\"` (or `\"reject\"` if you cannot stop yet).\n"
        .to_string()
}

/// Replace `inbox.md` with the shutdown instruction and enqueue its
/// trigger dispatch, mirroring [`write_initial_inbox_and_trigger`]'s
/// idempotency contract.
pub fn write_shutdown_inbox_and_trigger(
    store: &StateStore,
    team: &TeamName,
    worker: &WorkerName,
    worker_index: u32,
    message_id: MessageId,
    next_request_id: impl FnOnce() -> RequestId,
    now_ms: u64,
) -> Result<omx_core::DispatchRequest, EngineError> {
    messaging::replace_inbox(store, team, worker, &render_shutdown_inbox())?;
    let trigger = format!("shutdown requested, {}", worker.as_str());
    omx_core::validate_trigger_message(&trigger).map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    messaging::enqueue_mailbox_dispatch(
        store,
        team,
        worker,
        worker_index,
        &message_id,
        trigger,
        next_request_id,
        now_ms,
    )
}

fn shutdown_ack_path(store: &StateStore, team: &TeamName, worker: &WorkerName) -> Result<std::path::PathBuf, EngineError> {
    omx_storage::worker_shutdown_ack_path(&store.state_root(), team.as_str(), worker.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))
}

/// Poll `<worker>/shutdown-ack.json` up to `max_attempts` times, returning
/// the ack if one lands, or `None` on timeout (§4.8).
pub async fn wait_for_shutdown_ack(
    store: &StateStore,
    team: &TeamName,
    worker: &WorkerName,
    max_attempts: usize,
    poll_interval: Duration,
) -> Result<Option<ShutdownAck>, EngineError> {
    let path = shutdown_ack_path(store, team, worker)?;
    for attempt in 0..max_attempts.max(1) {
        if let Some(ack) = store.read_path::<ShutdownAck>(&path)? {
            return Ok(Some(ack));
        }
        if attempt + 1 < max_attempts && !poll_interval.is_zero() {
            tokio::time::sleep(poll_interval).await;
        }
    }
    Ok(None)
}

/// Wait for a shutdown ack; if none lands within `max_attempts`, kill the
/// pane unconditionally and report a forced shutdown (§4.8).
pub async fn force_shutdown<A: SessionAdapter>(
    adapter: &A,
    store: &StateStore,
    team: &TeamName,
    worker: &WorkerName,
    pane_id: &str,
    max_attempts: usize,
    poll_interval: Duration,
) -> Result<Option<ShutdownAck>, EngineError> {
    let ack = wait_for_shutdown_ack(store, team, worker, max_attempts, poll_interval).await?;
    if ack.is_none() {
        adapter.kill(pane_id).await.map_err(|e| EngineError::TmuxUnavailable(e.to_string()))?;
    }
    Ok(ack)
}

/// Resolve a worker's currently recorded pane id from its persisted
/// identity, for callers that only have a `(team, worker)` pair.
pub fn worker_pane_id(store: &StateStore, team: &TeamName, worker: &WorkerName) -> Result<Option<String>, EngineError> {
    let path = omx_storage::worker_identity_path(&store.state_root(), team.as_str(), worker.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    Ok(store.read_path::<WorkerIdentity>(&path)?.and_then(|identity| identity.pane_id))
}

/// Find a spawned pane whose `current_path` matches `cwd`, used when a
/// worker's recorded pane id has gone stale and needs re-resolution before
/// a readiness check (mirrors the dispatch engine's target healing, §4.5).
pub async fn find_pane_by_cwd<A: SessionAdapter>(adapter: &A, cwd: &std::path::Path) -> Result<Option<PaneInfo>, EngineError> {
    let panes = adapter.list_panes().await.map_err(|e| EngineError::TmuxUnavailable(e.to_string()))?;
    Ok(panes.into_iter().find(|p| p.current_path == cwd))
}

#[cfg(test)]
#[path = "worker_glue_tests.rs"]
mod tests;

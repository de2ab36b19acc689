// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notify-hook drainer (§4.6): the single-tick driver invoked on every
//! turn-complete event from the host CLI. Advances active mode iteration
//! counters, mirrors a finished `team` mode into its linked `ralph` peer,
//! and — leader only — drains queued dispatch requests into their target
//! panes.

use std::path::Path;

use omx_adapters::session::SessionAdapter;
use omx_core::{DispatchRequest, TeamName, WorkerIdentity};
use omx_storage::{Scope, StateStore};

use crate::dispatch_engine::{send_and_verify, NormalizedConfig};
use crate::error::EngineError;
use crate::messaging::{self, NotifyOutcome};
use crate::mode_lifecycle::{self, ALL_MODE_KINDS};

/// Identify the process's role from `OMX_TEAM_WORKER`: leader if unset
/// (§4.6 step 1). A thin env-reading wrapper; the rest of this module
/// takes the resolved `bool` as a plain argument so it stays testable
/// without touching the process environment.
pub fn is_leader() -> bool {
    omx_adapters::env::team_worker().is_none()
}

/// Resolve the state store to drain against: `OMX_TEAM_STATE_ROOT` if set
/// (expected to name a project's `.omx/state` directory directly), else
/// `<cwd>/.omx/state` (§4.6 step 1).
pub fn resolve_store(cwd: &Path) -> StateStore {
    match omx_adapters::env::team_state_root_override() {
        Some(state_root) => {
            let project_root = state_root
                .parent()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| cwd.to_path_buf());
            StateStore::new(project_root)
        }
        None => StateStore::new(cwd.to_path_buf()),
    }
}

/// Global scope plus the one session scope in play: the event's own
/// `session_id` if it carries one, otherwise the current session pointer
/// (§4.6 step 4).
fn target_scopes(store: &StateStore, session_id: Option<&str>) -> Result<Vec<Scope>, EngineError> {
    let session_scope = match session_id {
        Some(id) => Scope::Session(id.to_string()),
        None => store.current_session_scope()?,
    };
    let mut scopes = vec![Scope::Global];
    if session_scope != Scope::Global {
        scopes.push(session_scope);
    }
    Ok(scopes)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModeAdvanceReport {
    pub advanced: u32,
    pub completed: u32,
}

/// Advance every active mode in `scope` by one turn (§4.6 step 2): bump
/// `iteration`, set `last_turn_at`, and retire the mode once it hits its
/// `max_iterations` cap.
pub fn advance_active_modes(store: &StateStore, scope: &Scope, now_ms: u64) -> Result<ModeAdvanceReport, EngineError> {
    let mut report = ModeAdvanceReport::default();
    for kind in ALL_MODE_KINDS {
        let Some(state) = mode_lifecycle::read_mode(store, kind, scope)? else {
            continue;
        };
        if !state.active {
            continue;
        }
        let completed_this_tick = mode_lifecycle::update_mode_state(store, kind, scope, |state| {
            state.iteration += 1;
            state.last_turn_at_ms = Some(now_ms);
            if let Some(max) = state.max_iterations {
                if state.iteration >= max {
                    state.active = false;
                    state.current_phase = "complete".to_string();
                    state.stop_reason = Some("max_iterations_reached".to_string());
                    state.completed_at_ms = Some(now_ms);
                }
            }
        })?;
        report.advanced += 1;
        if !completed_this_tick.active {
            report.completed += 1;
        }
    }
    Ok(report)
}

/// Mirror a finished `team` mode into its linked `ralph` peer (§4.6 step 3,
/// §8 scenario 3): once `team` goes non-active with a terminal phase and
/// `linked_ralph` set, the matching `ralph-state.json` in the same scope is
/// marked non-active too, so a single cancel/complete cascades instead of
/// leaving a phantom ralph loop running.
pub fn sync_linked_terminal(store: &StateStore, scope: &Scope, now_ms: u64) -> Result<u32, EngineError> {
    use omx_core::ModeKind;

    let Some(team_state) = mode_lifecycle::read_mode(store, ModeKind::Team, scope)? else {
        return Ok(0);
    };
    if team_state.active || !team_state.linked_ralph {
        return Ok(0);
    }
    if !matches!(team_state.current_phase.as_str(), "complete" | "failed") {
        return Ok(0);
    }
    if mode_lifecycle::read_mode(store, ModeKind::Ralph, scope)?.is_none() {
        return Ok(0);
    }

    mode_lifecycle::update_mode_state(store, ModeKind::Ralph, scope, |ralph| {
        ralph.active = false;
        ralph.current_phase = team_state.current_phase.clone();
        if let Some(completed_at) = team_state.completed_at_ms {
            ralph.completed_at_ms = Some(completed_at);
        }
        ralph.linked_team_terminal_phase = Some(team_state.current_phase.clone());
        ralph.linked_team_terminal_at_ms = Some(now_ms);
        ralph.last_turn_at_ms = Some(now_ms);
    })?;
    Ok(1)
}

fn worker_pane_id(store: &StateStore, team: &TeamName, request: &DispatchRequest) -> Result<Option<String>, EngineError> {
    let path = omx_storage::worker_identity_path(&store.state_root(), team.as_str(), request.target_worker.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    let identity: Option<WorkerIdentity> = store.read_path(&path)?;
    Ok(identity.and_then(|i| i.pane_id))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchDrainReport {
    pub processed: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// Attempt delivery of one dispatch request: resolve its target worker's
/// pane, honor the scrollback guard, then reuse the dispatch engine's
/// three-step send-and-verify sequence (§4.5) against that pane.
async fn inject_request<A: SessionAdapter>(
    store: &StateStore,
    adapter: &A,
    config: &NormalizedConfig,
    team: &TeamName,
    request: &DispatchRequest,
) -> Result<NotifyOutcome, EngineError> {
    let Some(pane_id) = worker_pane_id(store, team, request)? else {
        return Ok(NotifyOutcome::Failed("target worker has no assigned pane".to_string()));
    };
    let alive = adapter
        .is_alive(&pane_id)
        .await
        .map_err(|e| EngineError::TmuxUnavailable(e.to_string()))?;
    if !alive {
        return Ok(NotifyOutcome::Failed("target pane is not alive".to_string()));
    }
    if config.skip_if_scrolling {
        let scrolling = adapter
            .pane_in_mode(&pane_id)
            .await
            .map_err(|e| EngineError::TmuxUnavailable(e.to_string()))?;
        if scrolling {
            return Err(EngineError::ScrollActive);
        }
    }
    send_and_verify(adapter, config, &pane_id, &request.trigger_message).await
}

/// Drain every team's pending dispatch requests, oldest-first across
/// teams, up to `config.dispatch_max_per_tick` total (§4.6 step 5,
/// leader-only). Requests that prefer a non-hook transport without
/// `fallback_allowed` are skipped, not consumed, so another transport gets
/// a turn at them.
pub async fn drain_dispatch<A: SessionAdapter>(
    store: &StateStore,
    config: &NormalizedConfig,
    adapter: &A,
    now_ms: u64,
) -> Result<DispatchDrainReport, EngineError> {
    let mut queue: Vec<(TeamName, DispatchRequest)> = Vec::new();
    for team_str in store.list_teams()? {
        let team = TeamName::parse(team_str).map_err(|e| EngineError::InvalidInput(e.to_string()))?;
        for request in messaging::pending_requests(store, &team)? {
            queue.push((team.clone(), request));
        }
    }
    queue.sort_by_key(|(_, request)| request.created_at_ms);

    let mut report = DispatchDrainReport::default();
    for (team, mut request) in queue.into_iter().take(config.dispatch_max_per_tick as usize) {
        if let Some(preference) = &request.transport_preference {
            if preference != omx_core::dispatch::TRANSPORT_HOOK && !request.fallback_allowed {
                report.skipped += 1;
                continue;
            }
        }

        let outcome = match inject_request(store, adapter, config, &team, &request).await {
            Ok(outcome) => outcome,
            Err(EngineError::ScrollActive) => {
                report.skipped += 1;
                continue;
            }
            Err(e) => NotifyOutcome::Threw(e.to_string()),
        };
        match &outcome {
            NotifyOutcome::Confirmed | NotifyOutcome::Unconfirmed => report.processed += 1,
            NotifyOutcome::Failed(_) | NotifyOutcome::Threw(_) => report.failed += 1,
        }
        messaging::apply_notify_outcome(store, &team, &mut request, outcome, now_ms)?;
    }
    Ok(report)
}

/// Everything a single drain tick did, for the daily log line and for
/// callers (e.g. the CLI hook command) that want to report a summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrainTickReport {
    pub modes_advanced: u32,
    pub modes_completed: u32,
    pub linked_terminal_syncs: u32,
    pub dispatch: DispatchDrainReport,
}

/// Run one full drain tick (§4.6): advance modes, sync linked terminals,
/// and — leader only — drain dispatch requests. Never propagates a
/// failure from any individual step; each is logged as a warning and
/// skipped; this mirrors §7's rule that log/drain partial failures are
/// warnings, not tick failures, since the drainer has no long-lived
/// blocking primitive to retry from.
#[allow(clippy::too_many_arguments)]
pub async fn drain_tick<A: SessionAdapter>(
    store: &StateStore,
    adapter: &A,
    config: &NormalizedConfig,
    is_leader: bool,
    session_id: Option<&str>,
    now_ms: u64,
) -> DrainTickReport {
    let mut report = DrainTickReport::default();

    match target_scopes(store, session_id) {
        Ok(scopes) => {
            for scope in &scopes {
                match advance_active_modes(store, scope, now_ms) {
                    Ok(r) => {
                        report.modes_advanced += r.advanced;
                        report.modes_completed += r.completed;
                    }
                    Err(e) => tracing::warn!(error = %e, "drain tick: failed to advance active modes"),
                }
                match sync_linked_terminal(store, scope, now_ms) {
                    Ok(synced) => report.linked_terminal_syncs += synced,
                    Err(e) => tracing::warn!(error = %e, "drain tick: failed to sync linked terminal state"),
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "drain tick: failed to resolve target scopes"),
    }

    if is_leader {
        match drain_dispatch(store, config, adapter, now_ms).await {
            Ok(dispatch) => report.dispatch = dispatch,
            Err(e) => tracing::warn!(error = %e, "drain tick: dispatch drain failed"),
        }
    }

    crate::daily_log::append_daily_log(
        store,
        &serde_json::json!({
            "event": "drain_tick",
            "is_leader": is_leader,
            "modes_advanced": report.modes_advanced,
            "modes_completed": report.modes_completed,
            "linked_terminal_syncs": report.linked_terminal_syncs,
            "dispatch_processed": report.dispatch.processed,
            "dispatch_skipped": report.dispatch.skipped,
            "dispatch_failed": report.dispatch.failed,
            "at_ms": now_ms,
        }),
        now_ms,
    );

    report
}

#[cfg(test)]
#[path = "drainer_tests.rs"]
mod tests;

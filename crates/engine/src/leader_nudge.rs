// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Team leader nudge cooldown (§10.5 of the expanded spec): a
//! `team_leader_nudge` event is appended only if the last nudge for the
//! team is older than `cooldown_ms`, the same cooldown-gate shape the
//! dispatch engine's `cooldown_ms` guard uses for pane injections.

use serde::{Deserialize, Serialize};

use omx_core::{TeamEvent, TeamName};
use omx_storage::StateStore;

use crate::error::EngineError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LeaderNudgeState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_nudge_at_ms: Option<u64>,
}

fn state_path(store: &StateStore, team: &TeamName) -> Result<std::path::PathBuf, EngineError> {
    omx_storage::leader_nudge_state_path(&store.state_root(), team.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))
}

/// Append a `team_leader_nudge` event if the last one for `team` is at
/// least `cooldown_ms` old (or there has never been one), and record the
/// new timestamp. Returns whether a nudge was actually recorded.
pub fn maybe_nudge_leader(
    store: &StateStore,
    team: &TeamName,
    cooldown_ms: u64,
    now_ms: u64,
) -> Result<bool, EngineError> {
    let path = state_path(store, team)?;
    let state: LeaderNudgeState = store.read_path(&path)?.unwrap_or_default();

    let due = match state.last_nudge_at_ms {
        Some(last) => now_ms.saturating_sub(last) >= cooldown_ms,
        None => true,
    };
    if !due {
        return Ok(false);
    }

    let events_path = omx_storage::team_events_path(&store.state_root(), team.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    store.append_jsonl(&events_path, &TeamEvent::TeamLeaderNudge { at_ms: now_ms })?;

    store.write_path(
        &path,
        &LeaderNudgeState {
            last_nudge_at_ms: Some(now_ms),
        },
    )?;
    Ok(true)
}

#[cfg(test)]
#[path = "leader_nudge_tests.rs"]
mod tests;

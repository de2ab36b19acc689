// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::path::PathBuf;
use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// `<team>/<worker>` identity of the process, set on every spawned worker
/// pane; unset (`None`) identifies the leader (§4.6, §4.8).
pub fn team_worker() -> Option<String> {
    std::env::var("OMX_TEAM_WORKER").ok().filter(|s| !s.is_empty())
}

/// Override for the state tree root the drainer resolves against, in
/// place of `<cwd>/.omx/state` (§4.6).
pub fn team_state_root_override() -> Option<PathBuf> {
    std::env::var_os("OMX_TEAM_STATE_ROOT").map(PathBuf::from).filter(|p| !p.as_os_str().is_empty())
}

/// The pane id the current process is running inside, if any (`TMUX_PANE`),
/// used by dispatch target healing (§4.5).
pub fn tmux_pane() -> Option<String> {
    std::env::var("TMUX_PANE").ok().filter(|s| !s.is_empty())
}

/// Drainer's fallback poll interval when no turn-complete event arrives
/// (default: 5000ms).
pub fn drainer_poll_ms() -> Duration {
    parse_duration_ms("OMX_DRAINER_POLL_MS").unwrap_or(Duration::from_secs(5))
}

/// Session liveness poll interval used while waiting on a worker pane to
/// exit (default: 1000ms).
pub fn session_poll_ms() -> Duration {
    parse_duration_ms("OMX_SESSION_POLL_MS").unwrap_or(Duration::from_secs(1))
}

/// Worker readiness total poll budget (default: 3000ms).
/// Returns the number of 200ms poll attempts.
pub fn worker_ready_max_attempts() -> usize {
    parse_duration_ms("OMX_WORKER_READY_POLL_MS")
        .map(|d| (d.as_millis() / 200).max(1) as usize)
        .unwrap_or(15)
}

/// Minimum spacing between `team_leader_nudge` events for the same team
/// (default: 5 minutes), reusing the dispatch engine's cooldown-gate shape.
pub fn team_leader_nudge_cooldown_ms() -> Duration {
    parse_duration_ms("OMX_TEAM_LEADER_NUDGE_MS").unwrap_or(Duration::from_secs(300))
}

/// How many days of daily logs to keep as plaintext before `rotate_daily_log`
/// compresses them (default: 7).
pub fn log_retention_days() -> u32 {
    std::env::var("OMX_LOG_RETENTION_DAYS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(7)
}

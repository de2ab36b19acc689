// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session start/end and staleness detection (§4.9). Staleness never uses a
//! wall-clock age threshold: a session is stale exactly when its recorded
//! owning process can be shown not to be the live one anymore.

use std::path::Path;

use serde::{Deserialize, Serialize};

use omx_core::{SessionId, SessionRecord};
use omx_storage::{Scope, StateStore};

use crate::error::EngineError;
use crate::mode_lifecycle;

#[cfg(target_os = "linux")]
fn read_start_ticks(pid: u32) -> Option<u64> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    // Field 2 (`comm`) is parenthesized and may contain spaces, so split
    // after its closing paren rather than on every whitespace run.
    let after_comm = stat.rsplit_once(')')?.1;
    after_comm.split_whitespace().nth(19).and_then(|s| s.parse().ok())
}

#[cfg(not(target_os = "linux"))]
fn read_start_ticks(_pid: u32) -> Option<u64> {
    None
}

#[cfg(target_os = "linux")]
fn read_cmdline(pid: u32) -> Option<String> {
    let raw = std::fs::read(format!("/proc/{pid}/cmdline")).ok()?;
    let normalized = String::from_utf8_lossy(&raw).replace('\0', " ").trim().to_string();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

#[cfg(not(target_os = "linux"))]
fn read_cmdline(_pid: u32) -> Option<String> {
    None
}

/// Equivalent to `kill(pid, 0)` on Linux without `unsafe`: `/proc/<pid>`
/// exists for exactly as long as the process does. Other platforms have no
/// safe stdlib-only equivalent, so liveness is assumed and the start-ticks
/// / cmdline fingerprints below carry the staleness check instead.
#[cfg(target_os = "linux")]
fn pid_is_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(not(target_os = "linux"))]
fn pid_is_alive(_pid: u32) -> bool {
    true
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ZeroedSnapshot {
    #[serde(flatten)]
    fields: std::collections::HashMap<String, serde_json::Value>,
}

/// If `<root>/session.json` points at a stale previous session (crashed or
/// killed without a clean `session end`), cancel every active mode state
/// under that session's scope and archive it to session history (§8
/// testable property 8: no mode state under a reaped session's scope stays
/// `active:true`). Returns the reaped session id, if any.
pub fn reap_stale_session(store: &StateStore, now_ms: u64) -> Result<Option<SessionId>, EngineError> {
    let pointer_path = omx_storage::session_pointer_path(&store.state_root());
    let Some(previous) = store.read_path::<SessionRecord>(&pointer_path)? else {
        return Ok(None);
    };
    if !is_session_stale(&previous) {
        return Ok(None);
    }

    mode_lifecycle::cancel_all_modes(store, &Scope::Session(previous.id.as_str().to_string()), now_ms)?;
    write_session_end(store, &previous.id, now_ms)?;

    crate::daily_log::append_daily_log(
        store,
        &serde_json::json!({
            "event": "session_reaped",
            "session_id": previous.id.as_str(),
            "pid": previous.pid,
            "at_ms": now_ms,
        }),
        now_ms,
    );

    Ok(Some(previous.id))
}

/// Create `<root>/session.json`, capture liveness fingerprints, append a
/// `session_start` log line, and zero the session-scoped HUD/metric files
/// (§4.9).
pub fn write_session_start(
    store: &StateStore,
    cwd: &Path,
    session_id: SessionId,
    now_ms: u64,
) -> Result<SessionRecord, EngineError> {
    let pid = std::process::id();
    let record = SessionRecord {
        id: session_id.clone(),
        cwd: cwd.to_path_buf(),
        pid,
        platform: std::env::consts::OS.to_string(),
        start_ticks: read_start_ticks(pid),
        cmdline_hint: read_cmdline(pid),
        started_at_ms: now_ms,
        ended_at_ms: None,
    };

    let pointer_path = omx_storage::session_pointer_path(&store.state_root());
    store.write_path(&pointer_path, &record)?;

    let metrics_path = omx_storage::session_metrics_path(&store.state_root(), session_id.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    store.write_path(&metrics_path, &ZeroedSnapshot::default())?;

    let hud_path = omx_storage::session_hud_state_path(&store.state_root(), session_id.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    store.write_path(&hud_path, &ZeroedSnapshot::default())?;

    crate::daily_log::append_daily_log(
        store,
        &serde_json::json!({
            "event": "session_start",
            "session_id": session_id.as_str(),
            "pid": pid,
            "at_ms": now_ms,
        }),
        now_ms,
    );

    Ok(record)
}

/// A session is stale exactly when its recorded owning process can be
/// shown not to be the live one: no wall-clock threshold is used (§4.9).
pub fn is_session_stale(state: &SessionRecord) -> bool {
    if state.pid == 0 {
        return true;
    }
    if !pid_is_alive(state.pid) {
        return true;
    }
    if let Some(recorded_ticks) = state.start_ticks {
        match read_start_ticks(state.pid) {
            Some(live_ticks) if live_ticks == recorded_ticks => {}
            _ => return true,
        }
    }
    if let Some(recorded_cmdline) = &state.cmdline_hint {
        match read_cmdline(state.pid) {
            Some(live_cmdline) if &live_cmdline == recorded_cmdline => {}
            _ => return true,
        }
    }
    false
}

/// Append a session-history record, delete `session.json`, and log
/// `session_end` (§4.9).
pub fn write_session_end(store: &StateStore, session_id: &SessionId, now_ms: u64) -> Result<(), EngineError> {
    let history_path = omx_storage::session_history_path(&store.state_root());
    store.append_jsonl(
        &history_path,
        &serde_json::json!({
            "session_id": session_id.as_str(),
            "ended_at_ms": now_ms,
        }),
    )?;

    let pointer_path = omx_storage::session_pointer_path(&store.state_root());
    match std::fs::remove_file(&pointer_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(EngineError::MalformedState(e.to_string())),
    }

    crate::daily_log::append_daily_log(
        store,
        &serde_json::json!({
            "event": "session_end",
            "session_id": session_id.as_str(),
            "at_ms": now_ms,
        }),
        now_ms,
    );
    Ok(())
}

#[cfg(test)]
#[path = "session_lifecycle_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier and lifecycle record.
//!
//! A `SessionId` identifies a product session, i.e. a directory scope under
//! `.omx/state/sessions/<id>/` distinct from the global scope. This is
//! unrelated to a multiplexer (tmux) session; see the glossary.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a product session.
    pub struct SessionId;
}

/// Liveness record written at session start and checked by
/// [`crate::clock`]-independent staleness detection (no wall-clock timeout;
/// staleness is a PID + start-ticks + cmdline check performed by the
/// storage layer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "session_id")]
    pub id: SessionId,
    pub cwd: std::path::PathBuf,
    pub pid: u32,
    pub platform: String,
    /// Process start time in clock ticks since boot, read from
    /// `/proc/<pid>/stat` field 22 on Linux. Used together with `pid` and
    /// `cmdline_hint` to distinguish a live owning process from a PID that
    /// has since been recycled by the OS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ticks: Option<u64>,
    /// A short, non-authoritative hint about the owning process's argv[0],
    /// used only to strengthen the staleness check, never to match exactly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmdline_hint: Option<String>,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at_ms: Option<u64>,
}

impl SessionRecord {
    pub fn is_ended(&self) -> bool {
        self.ended_at_ms.is_some()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed set of team events appended to `events.jsonl`, and a
//! read-side summarizer for the status surface.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::task::TaskId;
use crate::worker::WorkerName;

/// A single recorded team event. Closed enum: new event kinds require a
/// new variant, never a free-form `extra` map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TeamEvent {
    TaskCompleted {
        task: TaskId,
        worker: WorkerName,
        at_ms: u64,
    },
    TaskFailed {
        task: TaskId,
        worker: WorkerName,
        reason: String,
        at_ms: u64,
    },
    WorkerIdle {
        worker: WorkerName,
        at_ms: u64,
    },
    WorkerStopped {
        worker: WorkerName,
        at_ms: u64,
    },
    MessageReceived {
        to_worker: WorkerName,
        message_id: String,
        at_ms: u64,
    },
    ShutdownAck {
        worker: WorkerName,
        accepted: bool,
        at_ms: u64,
    },
    ShutdownGate {
        worker: WorkerName,
        at_ms: u64,
    },
    ShutdownGateForced {
        worker: WorkerName,
        at_ms: u64,
    },
    ApprovalDecision {
        task: TaskId,
        approved: bool,
        at_ms: u64,
    },
    TeamLeaderNudge {
        at_ms: u64,
    },
}

impl TeamEvent {
    /// The `kind` discriminant as it appears on the wire, for the
    /// summarizer and for log fields.
    pub fn kind_str(&self) -> &'static str {
        match self {
            TeamEvent::TaskCompleted { .. } => "task_completed",
            TeamEvent::TaskFailed { .. } => "task_failed",
            TeamEvent::WorkerIdle { .. } => "worker_idle",
            TeamEvent::WorkerStopped { .. } => "worker_stopped",
            TeamEvent::MessageReceived { .. } => "message_received",
            TeamEvent::ShutdownAck { .. } => "shutdown_ack",
            TeamEvent::ShutdownGate { .. } => "shutdown_gate",
            TeamEvent::ShutdownGateForced { .. } => "shutdown_gate_forced",
            TeamEvent::ApprovalDecision { .. } => "approval_decision",
            TeamEvent::TeamLeaderNudge { .. } => "team_leader_nudge",
        }
    }

    pub fn at_ms(&self) -> u64 {
        match self {
            TeamEvent::TaskCompleted { at_ms, .. }
            | TeamEvent::TaskFailed { at_ms, .. }
            | TeamEvent::WorkerIdle { at_ms, .. }
            | TeamEvent::WorkerStopped { at_ms, .. }
            | TeamEvent::MessageReceived { at_ms, .. }
            | TeamEvent::ShutdownAck { at_ms, .. }
            | TeamEvent::ShutdownGate { at_ms, .. }
            | TeamEvent::ShutdownGateForced { at_ms, .. }
            | TeamEvent::ApprovalDecision { at_ms, .. }
            | TeamEvent::TeamLeaderNudge { at_ms } => *at_ms,
        }
    }
}

/// Fold an event log into per-kind counts, for the status surface. Pure
/// read-side helper; does not touch storage.
pub fn summarize_events(events: &[TeamEvent]) -> HashMap<&'static str, usize> {
    let mut counts = HashMap::new();
    for event in events {
        *counts.entry(event.kind_str()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

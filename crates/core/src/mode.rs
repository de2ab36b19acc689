// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mode state: the six operating modes a session can run, and the subset
//! that mutually exclude one another.

use serde::{Deserialize, Serialize};

/// The operating modes a session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Autopilot,
    Ralph,
    Ultrawork,
    Team,
    Ultraqa,
    Ralplan,
}

impl ModeKind {
    /// `{autopilot, ralph, ultrawork}`: starting one of these while another
    /// is active is a conflict, not a no-op (§4.10).
    pub const EXCLUSIVE: [ModeKind; 3] = [ModeKind::Autopilot, ModeKind::Ralph, ModeKind::Ultrawork];

    pub fn is_exclusive(&self) -> bool {
        Self::EXCLUSIVE.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::Autopilot => "autopilot",
            ModeKind::Ralph => "ralph",
            ModeKind::Ultrawork => "ultrawork",
            ModeKind::Team => "team",
            ModeKind::Ultraqa => "ultraqa",
            ModeKind::Ralplan => "ralplan",
        }
    }
}

impl std::fmt::Display for ModeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted state for a single active mode instance. Field shape mirrors
/// the on-disk `<mode>-state.json` contract (§3) directly; `active` is the
/// source of truth rather than a derived flag, since a drain tick or
/// `cancel` can end a mode without clearing every other field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeState {
    pub kind: ModeKind,
    pub active: bool,
    #[serde(default)]
    pub iteration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,
    pub current_phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_turn_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    /// Set when this mode should be cancelled alongside a linked `ralph`
    /// mode reaching a terminal phase (§4.6 linked terminal sync).
    #[serde(default)]
    pub linked_ralph: bool,
    /// Set when this mode should be cancelled alongside a linked
    /// `ultrawork` mode (§8 scenario 3).
    #[serde(default)]
    pub linked_ultrawork: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_team_terminal_phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_team_terminal_at_ms: Option<u64>,
    /// Recorded when a legacy Ralph phase alias was normalized on write
    /// (§4.10); `None` if `current_phase` needed no normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ralph_phase_normalized_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmux_pane_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmux_pane_set_at_ms: Option<u64>,
    /// Git worktree this mode was started in, if `--worktree`/`-w` was
    /// passed (§4.7).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_name: Option<String>,
}

impl ModeState {
    pub fn new(kind: ModeKind, started_at_ms: u64) -> Self {
        Self {
            kind,
            active: true,
            iteration: 0,
            max_iterations: None,
            current_phase: "starting".to_string(),
            task_description: None,
            started_at_ms,
            completed_at_ms: None,
            last_turn_at_ms: None,
            error: None,
            stop_reason: None,
            linked_ralph: false,
            linked_ultrawork: false,
            linked_team_terminal_phase: None,
            linked_team_terminal_at_ms: None,
            ralph_phase_normalized_from: None,
            tmux_pane_id: None,
            tmux_pane_set_at_ms: None,
            worktree_name: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Mark this mode cancelled (§4.10 `cancelMode`/`cancelAllModes`).
    pub fn cancel(&mut self, at_ms: u64) {
        self.active = false;
        self.current_phase = "cancelled".to_string();
        self.completed_at_ms = Some(at_ms);
    }
}

/// Closed set of Ralph phase names; legacy aliases are normalized into this
/// set on write (§4.10, §9 open question — the canonical list here is the
/// source of truth for this implementation). `failed` is included
/// alongside `complete`/`cancelled` so a `ralph` mode can mirror a linked
/// `team` mode's terminal phase verbatim (§4.6 linked terminal sync)
/// instead of having it misnormalized to `starting`.
pub const RALPH_PHASES: [&str; 6] = ["starting", "working", "reviewing", "complete", "cancelled", "failed"];

/// Normalize a possibly-legacy Ralph phase name into the closed set,
/// returning `(normalized, normalized_from)` where the second element is
/// `Some(original)` only if normalization actually changed the value.
pub fn ralph_phase_normalized_from(raw: &str) -> (String, Option<String>) {
    if RALPH_PHASES.contains(&raw) {
        return (raw.to_string(), None);
    }
    let normalized = match raw {
        "plan" | "planning" => "starting",
        "exec" | "executing" | "running" => "working",
        "verify" | "verifying" | "review" => "reviewing",
        "done" | "finished" => "complete",
        "aborted" | "stopped" => "cancelled",
        _ => "starting",
    };
    (normalized.to_string(), Some(raw.to_string()))
}

#[cfg(test)]
#[path = "mode_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Team phase state machine data model.
//!
//! `team-plan` → `team-prd` → `team-exec` → `team-verify` → either
//! `team-fix` → `team-exec` (loop back) or a terminal phase. The DAG
//! reconciliation rules that decide *when* to transition live in the
//! phase controller (outside this crate); this module only carries the
//! closed set of phases and the persisted state record.

use serde::{Deserialize, Serialize};

/// A non-terminal team phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TeamPhase {
    TeamPlan,
    TeamPrd,
    TeamExec,
    TeamVerify,
    TeamFix,
}

impl TeamPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamPhase::TeamPlan => "team-plan",
            TeamPhase::TeamPrd => "team-prd",
            TeamPhase::TeamExec => "team-exec",
            TeamPhase::TeamVerify => "team-verify",
            TeamPhase::TeamFix => "team-fix",
        }
    }

    /// Phases that may be the reconciliation target directly after
    /// `team-verify`, depending on outstanding task counts (§4.2).
    pub fn post_verify_candidates() -> [TeamPhase; 1] {
        [TeamPhase::TeamFix]
    }
}

impl std::fmt::Display for TeamPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A terminal outcome for a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    Complete,
    Failed,
}

impl std::fmt::Display for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Terminal::Complete => write!(f, "complete"),
            Terminal::Failed => write!(f, "failed"),
        }
    }
}

/// Either an active phase or a terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum PhaseOrTerminal {
    Phase(TeamPhase),
    Terminal(Terminal),
}

impl PhaseOrTerminal {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PhaseOrTerminal::Terminal(_))
    }
}

/// Persisted phase state for one team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamPhaseState {
    pub current: PhaseOrTerminal,
    pub entered_at_ms: u64,
    pub updated_at_ms: u64,
    /// Upper bound on `team-verify -> team-fix -> team-exec` cycles before
    /// the controller gives up and transitions to `failed` (§4.2).
    pub max_fix_attempts: u32,
    /// How many times `team-fix` has been entered from `team-verify` so
    /// far; bumped exactly on that transition, never elsewhere (§4.2).
    #[serde(default)]
    pub current_fix_attempt: u32,
    #[serde(default)]
    pub history: Vec<PhaseTransitionRecord>,
}

impl TeamPhaseState {
    pub fn new(entered_at_ms: u64, max_fix_attempts: u32) -> Self {
        Self {
            current: PhaseOrTerminal::Phase(TeamPhase::TeamPlan),
            entered_at_ms,
            updated_at_ms: entered_at_ms,
            max_fix_attempts,
            current_fix_attempt: 0,
            history: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }
}

/// One recorded transition, retained for diagnostics (§8 round-trip laws
/// rely on this history being append-only and order-preserving).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransitionRecord {
    pub from: PhaseOrTerminal,
    pub to: PhaseOrTerminal,
    pub at_ms: u64,
    pub reason: String,
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Team phase reconciliation (§4.2): given the outstanding task counts for
//! a team, walk the persisted phase forward along the canonical DAG
//!
//! ```text
//! team-plan -> team-prd -> team-exec -> team-verify -> complete
//!                                \\          /
//!                                 team-fix <-
//! ```
//!
//! one hop at a time, recording every hop as a [`PhaseTransitionRecord`].
//! The controller never mutates task state; it only reacts to it.

use omx_core::{PhaseOrTerminal, PhaseTransitionRecord, TeamPhase, TeamPhaseState, Terminal};
use omx_storage::StateStore;

use crate::error::EngineError;

/// Outstanding task counts for a team, as seen by the reconciler.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskCounts {
    pub pending: u64,
    pub blocked: u64,
    pub in_progress: u64,
    pub failed: u64,
}

impl TaskCounts {
    fn non_terminal(&self) -> u64 {
        self.pending + self.blocked + self.in_progress
    }
}

/// Infer the phase the team *should* be in given its outstanding work
/// (§4.2): no open work and nothing failed means verification (or
/// completion, once verification has already passed); no open work but
/// something failed means a fix round is due; anything else means work is
/// still in flight.
fn infer_target(counts: &TaskCounts, verification_pending: bool) -> PhaseOrTerminal {
    if counts.non_terminal() == 0 && counts.failed == 0 {
        if verification_pending {
            PhaseOrTerminal::Phase(TeamPhase::TeamVerify)
        } else {
            PhaseOrTerminal::Terminal(Terminal::Complete)
        }
    } else if counts.non_terminal() == 0 && counts.failed > 0 {
        PhaseOrTerminal::Phase(TeamPhase::TeamFix)
    } else {
        PhaseOrTerminal::Phase(TeamPhase::TeamExec)
    }
}

/// The single forward hop out of `current`, given where we're ultimately
/// headed. `team-verify`'s only two forward neighbors are `team-fix` and
/// `complete`; which one we take depends on `target`.
fn next_hop(current: TeamPhase, target: PhaseOrTerminal) -> PhaseOrTerminal {
    match current {
        TeamPhase::TeamPlan => PhaseOrTerminal::Phase(TeamPhase::TeamPrd),
        TeamPhase::TeamPrd => PhaseOrTerminal::Phase(TeamPhase::TeamExec),
        TeamPhase::TeamExec => PhaseOrTerminal::Phase(TeamPhase::TeamVerify),
        TeamPhase::TeamVerify => {
            if target == PhaseOrTerminal::Terminal(Terminal::Complete) {
                PhaseOrTerminal::Terminal(Terminal::Complete)
            } else {
                PhaseOrTerminal::Phase(TeamPhase::TeamFix)
            }
        }
        TeamPhase::TeamFix => PhaseOrTerminal::Phase(TeamPhase::TeamExec),
    }
}

fn push_transition(
    state: &mut TeamPhaseState,
    from: PhaseOrTerminal,
    to: PhaseOrTerminal,
    now_ms: u64,
    reason: &str,
) {
    state.history.push(PhaseTransitionRecord {
        from,
        to,
        at_ms: now_ms,
        reason: reason.to_string(),
    });
    state.current = to;
    state.updated_at_ms = now_ms;
}

/// Reconcile `state` against `counts`, returning the (possibly unchanged)
/// new state. Pure: callers are responsible for persisting the result.
///
/// A terminal phase never regresses back into the DAG on its own; if work
/// reopens after the team finished, the reconciler records one synthetic
/// `tasks_reopened` transition straight to the inferred target and resets
/// the fix-attempt counter, rather than replaying every intermediate hop.
pub fn reconcile(state: &TeamPhaseState, counts: &TaskCounts, verification_pending: bool, now_ms: u64) -> TeamPhaseState {
    let target = infer_target(counts, verification_pending);
    let mut next = state.clone();

    if next.current.is_terminal() {
        if next.current == target {
            return next;
        }
        let from = next.current;
        next.current_fix_attempt = 0;
        push_transition(&mut next, from, target, now_ms, "tasks_reopened");
        return next;
    }

    loop {
        if next.current == target {
            break;
        }
        let PhaseOrTerminal::Phase(current_phase) = next.current else {
            break;
        };
        let mut hop = next_hop(current_phase, target);
        let mut reason = "phase_advanced";

        if current_phase == TeamPhase::TeamVerify && hop == PhaseOrTerminal::Phase(TeamPhase::TeamFix) {
            if next.current_fix_attempt + 1 > next.max_fix_attempts {
                hop = PhaseOrTerminal::Terminal(Terminal::Failed);
                reason = "max_fix_attempts_reached";
            } else {
                next.current_fix_attempt += 1;
            }
        }

        let from = next.current;
        push_transition(&mut next, from, hop, now_ms, reason);

        if next.current.is_terminal() {
            break;
        }
    }

    next
}

/// Read the persisted phase state for `team`, reconcile it against
/// `counts`, and write the result back if it changed.
pub fn reconcile_and_persist(
    store: &StateStore,
    team: &str,
    counts: &TaskCounts,
    verification_pending: bool,
    now_ms: u64,
) -> Result<TeamPhaseState, EngineError> {
    let path = omx_storage::team_phase_state_path(&store.state_root(), team)
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    let current = store
        .read_path::<TeamPhaseState>(&path)?
        .unwrap_or_else(|| TeamPhaseState::new(now_ms, 3));
    let next = reconcile(&current, counts, verification_pending, now_ms);
    store.write_path(&path, &next)?;
    Ok(next)
}

#[cfg(test)]
#[path = "phase_controller_tests.rs"]
mod tests;

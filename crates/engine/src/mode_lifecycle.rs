// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive-mode gate, start/update/cancel, and the Ralph contract
//! normalizer (§4.10).

use omx_core::{ralph_phase_normalized_from, ModeKind, ModeState};
use omx_storage::{Scope, StateStore};

use crate::error::EngineError;

/// A pure function of the prior state (if any) and the freshly composed
/// state that may attach environment-derived fields (current pane id,
/// etc). Kept as an injected closure so the engine never reaches into the
/// process environment directly (§4.10).
pub type ContextEnricher<'a> = dyn Fn(Option<&ModeState>, ModeState) -> ModeState + 'a;

fn mode_kind_str(kind: ModeKind) -> &'static str {
    kind.as_str()
}

pub(crate) const ALL_MODE_KINDS: [ModeKind; 6] = [
    ModeKind::Autopilot,
    ModeKind::Ralph,
    ModeKind::Ultrawork,
    ModeKind::Team,
    ModeKind::Ultraqa,
    ModeKind::Ralplan,
];

pub(crate) fn read_mode(store: &StateStore, kind: ModeKind, scope: &Scope) -> Result<Option<ModeState>, EngineError> {
    Ok(store.read(mode_kind_str(kind), scope)?)
}

fn write_mode(store: &StateStore, kind: ModeKind, scope: &Scope, state: &ModeState) -> Result<(), EngineError> {
    store.write(mode_kind_str(kind), scope, state)?;
    Ok(())
}

/// Validate and normalize a Ralph mode state in place: `max_iterations`
/// must be a finite positive integer, and `current_phase` is mapped into
/// the closed set, recording the pre-normalization value.
fn apply_ralph_contract(state: &mut ModeState) -> Result<(), EngineError> {
    match state.max_iterations {
        Some(0) | None => {
            return Err(EngineError::InvalidInput(
                "max_iterations must be a finite positive integer".into(),
            ))
        }
        Some(_) => {}
    }
    let (normalized, normalized_from) = ralph_phase_normalized_from(&state.current_phase);
    state.current_phase = normalized;
    state.ralph_phase_normalized_from = normalized_from;
    Ok(())
}

/// Start `kind` in `scope`. Fails if any other exclusive-set member is
/// already active (§4.10, §8 scenario 1).
pub fn start_mode(
    store: &StateStore,
    kind: ModeKind,
    scope: &Scope,
    task_description: Option<String>,
    max_iterations: Option<u64>,
    now_ms: u64,
    enricher: &ContextEnricher<'_>,
) -> Result<ModeState, EngineError> {
    if kind.is_exclusive() {
        for other in ModeKind::EXCLUSIVE.into_iter().filter(|m| *m != kind) {
            match read_mode(store, other, scope) {
                Ok(Some(existing)) if existing.active => {
                    return Err(EngineError::ExclusiveModeActive(format!(
                        "Cannot start: {other} is already active"
                    )));
                }
                Ok(_) => {}
                Err(_) => {
                    return Err(EngineError::MalformedState(format!(
                        "Cannot start: {other} state malformed"
                    )));
                }
            }
        }
    }

    let prior = read_mode(store, kind, scope)?;
    let mut state = ModeState::new(kind, now_ms);
    state.task_description = task_description;
    state.max_iterations = max_iterations;
    state = enricher(prior.as_ref(), state);

    if kind == ModeKind::Ralph {
        apply_ralph_contract(&mut state)?;
    }

    write_mode(store, kind, scope, &state)?;
    Ok(state)
}

/// Merge `patch` into the persisted state for `kind`/`scope`, re-running the
/// Ralph contract when applicable, and write atomically.
pub fn update_mode_state(
    store: &StateStore,
    kind: ModeKind,
    scope: &Scope,
    patch: impl FnOnce(&mut ModeState),
) -> Result<ModeState, EngineError> {
    let mut state = read_mode(store, kind, scope)?
        .ok_or_else(|| EngineError::InvalidInput(format!("no {kind} state to update")))?;
    patch(&mut state);
    if kind == ModeKind::Ralph {
        apply_ralph_contract(&mut state)?;
    }
    write_mode(store, kind, scope, &state)?;
    Ok(state)
}

/// Cancel a single mode in `scope` (§8 scenario 3).
pub fn cancel_mode(store: &StateStore, kind: ModeKind, scope: &Scope, now_ms: u64) -> Result<Option<ModeState>, EngineError> {
    let Some(mut state) = read_mode(store, kind, scope)? else {
        return Ok(None);
    };
    state.cancel(now_ms);
    write_mode(store, kind, scope, &state)?;
    Ok(Some(state))
}

/// Cancel every active mode in `scope`, including linked modes whose
/// `linked_ralph`/`linked_ultrawork` flags point at a cancelled peer.
pub fn cancel_all_modes(store: &StateStore, scope: &Scope, now_ms: u64) -> Result<Vec<ModeState>, EngineError> {
    let mut cancelled = Vec::new();
    for kind in ALL_MODE_KINDS {
        if let Some(state) = cancel_mode(store, kind, scope, now_ms)? {
            cancelled.push(state);
        }
    }
    Ok(cancelled)
}

/// List every mode currently active in `scope`.
pub fn list_active_modes(store: &StateStore, scope: &Scope) -> Result<Vec<ModeState>, EngineError> {
    let mut active = Vec::new();
    for kind in ALL_MODE_KINDS {
        if let Some(state) = read_mode(store, kind, scope)? {
            if state.active {
                active.push(state);
            }
        }
    }
    Ok(active)
}

/// The identity enricher: attaches no environment context. Production
/// callers pass a closure that reads `TMUX_PANE` instead.
pub fn no_op_enricher() -> impl Fn(Option<&ModeState>, ModeState) -> ModeState {
    |_, state| state
}

#[cfg(test)]
#[path = "mode_lifecycle_tests.rs"]
mod tests;

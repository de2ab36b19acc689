// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the team-dispatch engine (§7): every component here
//! returns one of these kinds rather than inventing a parallel one.

use thiserror::Error;

use omx_core::{Classify, ErrorKind};
use omx_storage::StateStoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    State(#[from] StateStoreError),

    // Validation
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid worktree branch: {0}")]
    InvalidWorktreeBranch(String),

    // Conflict
    #[error("exclusive_mode_active: {0}")]
    ExclusiveModeActive(String),
    #[error("worktree_path_conflict: {0}")]
    WorktreePathConflict(String),
    #[error("worktree_target_mismatch: {0}")]
    WorktreeTargetMismatch(String),
    #[error("branch_in_use: {0}")]
    BranchInUse(String),
    #[error("not_claimable: {0}")]
    NotClaimable(String),
    #[error("invalid_transition: {0}")]
    InvalidTransition(String),

    // Transport
    #[error("tmux_unavailable: {0}")]
    TmuxUnavailable(String),
    #[error("tmux_send_keys_unconfirmed")]
    TmuxSendKeysUnconfirmed,
    #[error("unconfirmed_after_max_retries")]
    UnconfirmedAfterMaxRetries,
    #[error("scroll_active")]
    ScrollActive,
    #[error("pane_cwd_mismatch")]
    PaneCwdMismatch,

    // Guard
    #[error("disabled")]
    Disabled,
    #[error("no_active_mode")]
    NoActiveMode,
    #[error("duplicate_event")]
    DuplicateEvent,
    #[error("cooldown_active")]
    CooldownActive,
    #[error("pane_cap_reached")]
    PaneCapReached,
    #[error("loop_guard_input_marker")]
    LoopGuardInputMarker,
    #[error("loop_guard_assistant_marker")]
    LoopGuardAssistantMarker,

    // State I/O
    #[error("malformed_state: {0}")]
    MalformedState(String),
    #[error("notify_exception: {0}")]
    NotifyException(String),
    #[error("worktree_rollback_failed: {0}")]
    WorktreeRollbackFailed(String),
}

impl Classify for EngineError {
    fn kind(&self) -> ErrorKind {
        use EngineError::*;
        match self {
            State(e) => e.kind(),
            InvalidInput(_) | InvalidWorktreeBranch(_) => ErrorKind::Validation,
            ExclusiveModeActive(_)
            | WorktreePathConflict(_)
            | WorktreeTargetMismatch(_)
            | BranchInUse(_)
            | NotClaimable(_)
            | InvalidTransition(_) => ErrorKind::Conflict,
            TmuxUnavailable(_)
            | TmuxSendKeysUnconfirmed
            | UnconfirmedAfterMaxRetries
            | ScrollActive
            | PaneCwdMismatch => ErrorKind::Transport,
            Disabled
            | NoActiveMode
            | DuplicateEvent
            | CooldownActive
            | PaneCapReached
            | LoopGuardInputMarker
            | LoopGuardAssistantMarker => ErrorKind::Guard,
            MalformedState(_) | NotifyException(_) | WorktreeRollbackFailed(_) => {
                ErrorKind::StateIo
            }
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! omx-core: shared domain types for the omx team-dispatch core.

pub mod clock;
pub mod decision;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod id;
pub mod mailbox;
pub mod mode;
pub mod phase;
pub mod session;
pub mod task;
pub mod team;
pub mod time_fmt;
pub mod validate;
pub mod worker;

pub use clock::{Clock, FakeClock, SystemClock};
pub use decision::ApprovalDecision;
pub use dispatch::{
    validate_trigger_message, DispatchHookConfig, DispatchHookRuntimeState, DispatchRequest,
    DispatchRequestKind, DispatchRequestStatus, DispatchTarget, RequestId, TriggerMessageError,
};
pub use error::{Classify, ErrorKind};
pub use event::{summarize_events, TeamEvent};
pub use id::{IdGen, SequentialIdGen, ShortId, UuidIdGen};
pub use mailbox::{Mailbox, MailboxMessage, MessageId};
pub use mode::{ralph_phase_normalized_from, ModeKind, ModeState, RALPH_PHASES};
pub use phase::{PhaseOrTerminal, PhaseTransitionRecord, TeamPhase, TeamPhaseState, Terminal};
pub use session::{SessionId, SessionRecord};
pub use task::{Task, TaskId, TaskIdError, TaskStatus, TaskTransitionError};
pub use team::{Team, TeamName};
pub use time_fmt::{format_elapsed, format_elapsed_ms};
pub use validate::{validate_slug, SlugError};
pub use worker::{WorkerId, WorkerIdentity, WorkerName, LEADER_FIXED};

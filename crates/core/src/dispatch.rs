// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch requests: pane-targeted prompt injections queued from the
//! mailbox/inbox messaging layer and drained by the dispatch engine.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a dispatch request; also its idempotency key
    /// when constructed deterministically from a `message_id`.
    pub struct RequestId;
}

const MAX_TRIGGER_MESSAGE_LEN: usize = 200;

/// What kind of payload a dispatch request delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchRequestKind {
    /// Points the target at its inbox file; the trigger message is a short
    /// nudge ("check your inbox"), not the instruction body itself.
    Inbox,
    /// Delivers a mailbox message's body directly as the trigger text.
    Mailbox,
}

/// Terminal/non-terminal status of a queued dispatch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchRequestStatus {
    Queued,
    Sent,
    Unconfirmed,
    Failed,
}

/// Error returned when a trigger message fails the wire contract in §6.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerMessageError {
    #[error("trigger message must be ASCII")]
    NotAscii,
    #[error("trigger message must be at most {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
    #[error("trigger message must not contain control characters or tmux injection markers")]
    ContainsInjectionMarker,
}

/// Validate a trigger message against the wire contract: fewer than 200
/// ASCII characters, no control characters or literal-mode escape markers
/// that could break the `send-keys -l` argv boundary.
pub fn validate_trigger_message(text: &str) -> Result<(), TriggerMessageError> {
    if !text.is_ascii() {
        return Err(TriggerMessageError::NotAscii);
    }
    if text.len() >= MAX_TRIGGER_MESSAGE_LEN {
        return Err(TriggerMessageError::TooLong {
            max: MAX_TRIGGER_MESSAGE_LEN,
            actual: text.len(),
        });
    }
    if text.bytes().any(|b| b < 0x20 && b != b'\t') {
        return Err(TriggerMessageError::ContainsInjectionMarker);
    }
    Ok(())
}

/// A queued pane injection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub id: RequestId,
    pub team: crate::team::TeamName,
    pub target_worker: crate::worker::WorkerName,
    pub kind: DispatchRequestKind,
    pub trigger_message: String,
    /// Idempotency dedupe key; for mailbox-kind requests this is the
    /// originating `message_id` so re-queueing the same message never
    /// produces two in-flight requests (§4.4).
    pub dedupe_key: String,
    pub status: DispatchRequestStatus,
    pub created_at_ms: u64,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at_ms: Option<u64>,
    /// If set, this request should only be drained by that transport; a
    /// drainer that isn't the preferred transport skips it unless
    /// `fallback_allowed` is true (§4.6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_preference: Option<String>,
    #[serde(default)]
    pub fallback_allowed: bool,
}

/// The hook-transport identifier the drainer compares `transport_preference`
/// against (§4.6).
pub const TRANSPORT_HOOK: &str = "transport_hook";

impl DispatchRequest {
    pub fn new(
        id: RequestId,
        team: crate::team::TeamName,
        target_worker: crate::worker::WorkerName,
        kind: DispatchRequestKind,
        trigger_message: String,
        dedupe_key: String,
        created_at_ms: u64,
    ) -> Result<Self, TriggerMessageError> {
        validate_trigger_message(&trigger_message)?;
        Ok(Self {
            id,
            team,
            target_worker,
            kind,
            trigger_message,
            dedupe_key,
            status: DispatchRequestStatus::Queued,
            created_at_ms,
            attempts: 0,
            last_attempt_at_ms: None,
            transport_preference: None,
            fallback_allowed: false,
        })
    }
}

/// Where the dispatch engine aims its pane injections: either a multiplexer
/// session (healed to a pane target lazily, §4.5) or a pane directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchTarget {
    Session { value: String },
    Pane { value: String },
}

/// Raw, possibly-partial on-disk shape of the dispatch hook config.
/// Normalized by `normalize_config` in the engine (§4.5) into concrete
/// defaults; this struct alone carries no default-filling behavior beyond
/// what `#[serde(default)]` gives every field, since a wholly-missing field
/// must still route through the same normalization step as a malformed one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchHookConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<DispatchTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_modes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_injections_per_session: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_if_scrolling: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_max_per_tick: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unconfirmed_attempts: Option<u32>,
}

/// Runtime bookkeeping the dispatch engine persists between ticks.
/// `recent_keys` is only written when an injection is actually allowed and
/// attempted (§4.5 guard 5, §8 invariant 5); `pane_counts` takes precedence
/// over `session_counts` when both are present (§9 open question).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchHookRuntimeState {
    #[serde(default)]
    pub total_injections: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_injection_ts: Option<u64>,
    #[serde(default)]
    pub recent_keys: std::collections::HashMap<String, u64>,
    #[serde(default)]
    pub pane_counts: std::collections::HashMap<String, u64>,
    #[serde(default)]
    pub session_counts: std::collections::HashMap<String, u64>,
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

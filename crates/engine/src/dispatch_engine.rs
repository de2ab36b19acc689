// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane-targeted prompt injection: config normalization, mode selection,
//! ordered guard evaluation, the three-argv send sequence, verification
//! with bounded retries, and target healing (§4.5).

use std::path::Path;

use sha2::{Digest, Sha256};

use omx_adapters::session::{PaneInfo, SessionAdapter, SessionError};
use omx_core::{DispatchHookConfig, DispatchHookRuntimeState, DispatchTarget, ModeKind};

use crate::error::EngineError;
use crate::messaging::NotifyOutcome;

const DEFAULT_MARKER: &str = "[OMX_TMUX_INJECT]";
const DEFAULT_DISPATCH_MAX_PER_TICK: u32 = 5;
const DEFAULT_MAX_UNCONFIRMED_ATTEMPTS: u32 = 3;
/// Width of the narrow input-area capture used to check whether the typed
/// trigger text is still sitting at the live prompt (§4.5 verification).
const NARROW_CAPTURE_LINES: u32 = 2;
const WIDE_CAPTURE_LINES: u32 = 200;
const VERIFY_ROUNDS: u32 = 3;

/// Fully defaulted dispatch hook config, ready for guard evaluation.
#[derive(Debug, Clone)]
pub struct NormalizedConfig {
    pub enabled: bool,
    pub target: Option<DispatchTarget>,
    pub allowed_modes: Vec<String>,
    pub cooldown_ms: u64,
    pub max_injections_per_session: u64,
    pub marker: String,
    pub dry_run: bool,
    pub log_level: String,
    pub skip_if_scrolling: bool,
    pub dispatch_max_per_tick: u32,
    pub max_unconfirmed_attempts: u32,
}

impl NormalizedConfig {
    fn disabled() -> Self {
        Self {
            enabled: false,
            target: None,
            allowed_modes: vec!["ralph".to_string()],
            cooldown_ms: 0,
            max_injections_per_session: 0,
            marker: DEFAULT_MARKER.to_string(),
            dry_run: false,
            log_level: "info".to_string(),
            skip_if_scrolling: true,
            dispatch_max_per_tick: DEFAULT_DISPATCH_MAX_PER_TICK,
            max_unconfirmed_attempts: DEFAULT_MAX_UNCONFIRMED_ATTEMPTS,
        }
    }
}

/// Fill defaults for a possibly-partial raw config (§4.5). A config with no
/// `target` can never resolve a pane to inject into, so it normalizes to
/// the safe disabled default regardless of any other field present.
pub fn normalize_config(raw: &DispatchHookConfig) -> NormalizedConfig {
    let Some(target) = raw.target.clone() else {
        return NormalizedConfig::disabled();
    };
    NormalizedConfig {
        enabled: raw.enabled.unwrap_or(true),
        target: Some(target),
        allowed_modes: raw
            .allowed_modes
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec!["ralph".to_string()]),
        cooldown_ms: raw.cooldown_ms.unwrap_or(0),
        max_injections_per_session: raw.max_injections_per_session.unwrap_or(0),
        marker: raw.marker.clone().unwrap_or_else(|| DEFAULT_MARKER.to_string()),
        dry_run: raw.dry_run.unwrap_or(false),
        log_level: raw.log_level.clone().unwrap_or_else(|| "info".to_string()),
        skip_if_scrolling: raw.skip_if_scrolling.unwrap_or(true),
        dispatch_max_per_tick: raw.dispatch_max_per_tick.unwrap_or(DEFAULT_DISPATCH_MAX_PER_TICK),
        max_unconfirmed_attempts: raw
            .max_unconfirmed_attempts
            .unwrap_or(DEFAULT_MAX_UNCONFIRMED_ATTEMPTS),
    }
}

/// The first mode in `allowed_modes` priority order that is currently
/// active, or `None` if none of the allowed modes are active (§4.5).
pub fn pick_active_mode(active_modes: &[ModeKind], allowed_modes: &[String]) -> Option<ModeKind> {
    allowed_modes
        .iter()
        .find_map(|name| active_modes.iter().find(|m| m.as_str() == name).copied())
}

/// `dedupeKey = hash(mode, sessionKey, turnId, normalizedSource)` (§4.5
/// guard 5). Stable across process restarts since it is a pure function of
/// its inputs, not a random id.
pub fn compute_dedupe_key(mode: ModeKind, session_key: &str, turn_id: &str, normalized_source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(mode.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(session_key.as_bytes());
    hasher.update(b"\0");
    hasher.update(turn_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(normalized_source.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A successful guard pass: what to send, where, and under which dedupe key.
#[derive(Debug, Clone)]
pub struct GuardSuccess {
    pub dedupe_key: String,
    pub pane_target: DispatchTarget,
    pub prompt_text: String,
}

/// Everything the guard chain needs to decide, gathered up front so the
/// evaluation itself stays a pure function (§4.5).
#[derive(Debug, Clone)]
pub struct GuardInput<'a> {
    pub active_modes: &'a [ModeKind],
    pub session_key: &'a str,
    pub pane_key: &'a str,
    pub turn_id: &'a str,
    pub source_text: &'a str,
    pub assistant_message: &'a str,
    pub prompt_text: &'a str,
    pub now_ms: u64,
}

/// Run the seven ordered guards, returning the first failure or a
/// [`GuardSuccess`] (§4.5). Does not mutate `runtime`; callers persist the
/// returned dedupe key themselves once the send has actually been
/// attempted, per the "never record on a skipped outcome" rule.
pub fn evaluate_injection_guards(
    config: &NormalizedConfig,
    runtime: &DispatchHookRuntimeState,
    input: &GuardInput<'_>,
) -> Result<GuardSuccess, EngineError> {
    if !config.enabled {
        return Err(EngineError::Disabled);
    }
    let Some(target) = config.target.clone() else {
        return Err(EngineError::Disabled);
    };
    let Some(mode) = pick_active_mode(input.active_modes, &config.allowed_modes) else {
        return Err(EngineError::NoActiveMode);
    };
    if input.source_text.contains(&config.marker) {
        return Err(EngineError::LoopGuardInputMarker);
    }
    if input.assistant_message.contains(&config.marker) {
        return Err(EngineError::LoopGuardAssistantMarker);
    }

    let dedupe_key = compute_dedupe_key(mode, input.session_key, input.turn_id, input.source_text);
    if let Some(&ts) = runtime.recent_keys.get(&dedupe_key) {
        if input.now_ms.saturating_sub(ts) < config.cooldown_ms {
            return Err(EngineError::DuplicateEvent);
        }
    }

    if let Some(last) = runtime.last_injection_ts {
        if input.now_ms.saturating_sub(last) < config.cooldown_ms {
            return Err(EngineError::CooldownActive);
        }
    }

    let count = runtime
        .pane_counts
        .get(input.pane_key)
        .copied()
        .unwrap_or_else(|| runtime.session_counts.get(input.session_key).copied().unwrap_or(0));
    if count >= config.max_injections_per_session {
        return Err(EngineError::PaneCapReached);
    }

    Ok(GuardSuccess {
        dedupe_key,
        pane_target: target,
        prompt_text: input.prompt_text.to_string(),
    })
}

/// Record that `dedupe_key` was allowed and actually attempted; called only
/// after a real (non-`dry_run`) send, never on a skip (§4.5, §8 invariant
/// 5).
pub fn record_injection(
    runtime: &mut DispatchHookRuntimeState,
    dedupe_key: &str,
    pane_key: &str,
    session_key: &str,
    reason: &str,
    now_ms: u64,
) {
    runtime.total_injections += 1;
    runtime.last_reason = Some(reason.to_string());
    runtime.last_injection_ts = Some(now_ms);
    runtime.recent_keys.insert(dedupe_key.to_string(), now_ms);
    *runtime.pane_counts.entry(pane_key.to_string()).or_insert(0) += 1;
    *runtime.session_counts.entry(session_key.to_string()).or_insert(0) += 1;
}

fn pane_id_of(target: &DispatchTarget) -> Option<&str> {
    match target {
        DispatchTarget::Pane { value } => Some(value),
        DispatchTarget::Session { .. } => None,
    }
}

/// Strip carriage returns and newlines so the `-l` typing call can never be
/// mistaken for a submit (§4.5 send sequence).
fn sanitize_for_literal_send(text: &str) -> String {
    text.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

/// Execute the three-step send sequence: type literally, then submit twice.
/// Returns `Ok(None)` for `dry_run` (no I/O performed), `Ok(Some(()))` on a
/// real send (§4.5).
pub async fn send_prompt<A: SessionAdapter>(
    adapter: &A,
    dry_run: bool,
    pane_id: &str,
    text: &str,
) -> Result<Option<()>, EngineError> {
    if dry_run {
        return Ok(None);
    }
    let clean = sanitize_for_literal_send(text);
    adapter
        .send_literal(pane_id, &clean)
        .await
        .map_err(map_session_error)?;
    adapter.send_enter(pane_id).await.map_err(map_session_error)?;
    adapter.send_enter(pane_id).await.map_err(map_session_error)?;
    Ok(Some(()))
}

fn map_session_error(e: SessionError) -> EngineError {
    EngineError::TmuxUnavailable(e.to_string())
}

/// Capture the pane's narrow input area and wide scrollback tail once.
async fn capture_pair<A: SessionAdapter>(adapter: &A, pane_id: &str) -> Result<(String, String), EngineError> {
    let narrow = adapter
        .capture_output(pane_id, NARROW_CAPTURE_LINES)
        .await
        .map_err(map_session_error)?;
    let wide = adapter
        .capture_output(pane_id, WIDE_CAPTURE_LINES)
        .await
        .map_err(map_session_error)?;
    Ok((narrow, wide))
}

/// Send, then verify up to [`VERIFY_ROUNDS`] rounds of narrow/wide capture
/// pairs, retyping only when the text has scrolled out of the narrow area
/// (§4.5 verification and retype policy).
pub async fn send_and_verify<A: SessionAdapter>(
    adapter: &A,
    config: &NormalizedConfig,
    pane_id: &str,
    trigger_text: &str,
) -> Result<NotifyOutcome, EngineError> {
    if config.dry_run {
        return Ok(NotifyOutcome::Confirmed);
    }

    send_prompt(adapter, false, pane_id, trigger_text).await?;

    for attempt in 0..config.max_unconfirmed_attempts.max(VERIFY_ROUNDS) {
        for _round in 0..VERIFY_ROUNDS {
            let (narrow, _wide) = capture_pair(adapter, pane_id).await?;
            if narrow.contains(trigger_text) {
                return Ok(NotifyOutcome::Confirmed);
            }
        }
        if attempt + 1 >= config.max_unconfirmed_attempts {
            break;
        }
        let (pre_narrow, _) = capture_pair(adapter, pane_id).await?;
        if pre_narrow.contains(trigger_text) {
            adapter.send_enter(pane_id).await.map_err(map_session_error)?;
            adapter.send_enter(pane_id).await.map_err(map_session_error)?;
        } else {
            send_prompt(adapter, false, pane_id, trigger_text).await?;
        }
    }

    Ok(NotifyOutcome::Unconfirmed)
}

/// If the configured target is a `session` that no longer resolves to a
/// live pane matching the hook's cwd, try the recorded mode pane id, then
/// `TMUX_PANE`, then any pane whose cwd matches (§4.5 target healing).
pub async fn heal_target<A: SessionAdapter>(
    adapter: &A,
    target: &DispatchTarget,
    mode_pane_id: Option<&str>,
    env_tmux_pane: Option<&str>,
    hook_cwd: &Path,
) -> Result<DispatchTarget, EngineError> {
    if let Some(pane) = pane_id_of(target) {
        if adapter.is_alive(pane).await.map_err(map_session_error)? {
            return Ok(target.clone());
        }
    }

    if let Some(pane) = mode_pane_id {
        if adapter.is_alive(pane).await.map_err(map_session_error)? {
            return Ok(DispatchTarget::Pane { value: pane.to_string() });
        }
    }
    if let Some(pane) = env_tmux_pane {
        if adapter.is_alive(pane).await.map_err(map_session_error)? {
            return Ok(DispatchTarget::Pane { value: pane.to_string() });
        }
    }

    let panes: Vec<PaneInfo> = adapter.list_panes().await.map_err(map_session_error)?;
    if let Some(matched) = panes.into_iter().find(|p| p.current_path == hook_cwd) {
        return Ok(DispatchTarget::Pane { value: matched.pane_id });
    }

    Err(EngineError::PaneCwdMismatch)
}

#[cfg(test)]
#[path = "dispatch_engine_tests.rs"]
mod tests;

use super::*;

use omx_adapters::session::FakeSessionAdapter;
use omx_core::DispatchHookConfig;

fn configured(target: DispatchTarget) -> NormalizedConfig {
    normalize_config(&DispatchHookConfig {
        target: Some(target),
        cooldown_ms: Some(1000),
        max_injections_per_session: Some(2),
        ..Default::default()
    })
}

fn pane_target() -> DispatchTarget {
    DispatchTarget::Pane { value: "%1".to_string() }
}

#[test]
fn missing_target_normalizes_to_disabled() {
    let cfg = normalize_config(&DispatchHookConfig::default());
    assert!(!cfg.enabled);
    assert!(cfg.target.is_none());
    assert_eq!(cfg.allowed_modes, vec!["ralph".to_string()]);
}

#[test]
fn present_target_fills_in_remaining_defaults() {
    let cfg = configured(pane_target());
    assert!(cfg.enabled);
    assert_eq!(cfg.marker, "[OMX_TMUX_INJECT]");
    assert!(cfg.skip_if_scrolling);
    assert!(!cfg.dry_run);
    assert_eq!(cfg.dispatch_max_per_tick, 5);
}

#[test]
fn pick_active_mode_respects_allowed_order_not_active_order() {
    let active = [ModeKind::Team, ModeKind::Ralph];
    let allowed = vec!["ralph".to_string(), "team".to_string()];
    assert_eq!(pick_active_mode(&active, &allowed), Some(ModeKind::Ralph));
}

#[test]
fn pick_active_mode_none_when_nothing_allowed_is_active() {
    let active = [ModeKind::Autopilot];
    let allowed = vec!["ralph".to_string()];
    assert_eq!(pick_active_mode(&active, &allowed), None);
}

#[test]
fn dedupe_key_is_stable_for_identical_inputs() {
    let a = compute_dedupe_key(ModeKind::Ralph, "sess-1", "turn-1", "hello");
    let b = compute_dedupe_key(ModeKind::Ralph, "sess-1", "turn-1", "hello");
    let c = compute_dedupe_key(ModeKind::Ralph, "sess-1", "turn-2", "hello");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

fn base_input<'a>(prompt: &'a str) -> GuardInput<'a> {
    GuardInput {
        active_modes: &[],
        session_key: "sess-1",
        pane_key: "%1",
        turn_id: "turn-1",
        source_text: "hi",
        assistant_message: "ok",
        prompt_text: prompt,
        now_ms: 10_000,
    }
}

#[test]
fn guard_order_disabled_first() {
    let cfg = normalize_config(&DispatchHookConfig::default());
    let runtime = DispatchHookRuntimeState::default();
    let err = evaluate_injection_guards(&cfg, &runtime, &base_input("p")).unwrap_err();
    assert!(matches!(err, EngineError::Disabled));
}

#[test]
fn guard_order_no_active_mode() {
    let cfg = configured(pane_target());
    let runtime = DispatchHookRuntimeState::default();
    let err = evaluate_injection_guards(&cfg, &runtime, &base_input("p")).unwrap_err();
    assert!(matches!(err, EngineError::NoActiveMode));
}

#[test]
fn guard_order_input_marker() {
    let cfg = configured(pane_target());
    let runtime = DispatchHookRuntimeState::default();
    let mut input = base_input("p");
    input.active_modes = &[ModeKind::Ralph];
    input.source_text = "contains [OMX_TMUX_INJECT] marker";
    let err = evaluate_injection_guards(&cfg, &runtime, &input).unwrap_err();
    assert!(matches!(err, EngineError::LoopGuardInputMarker));
}

#[test]
fn guard_order_assistant_marker() {
    let cfg = configured(pane_target());
    let runtime = DispatchHookRuntimeState::default();
    let mut input = base_input("p");
    input.active_modes = &[ModeKind::Ralph];
    input.assistant_message = "[OMX_TMUX_INJECT]";
    let err = evaluate_injection_guards(&cfg, &runtime, &input).unwrap_err();
    assert!(matches!(err, EngineError::LoopGuardAssistantMarker));
}

#[test]
fn guard_order_duplicate_event() {
    let cfg = configured(pane_target());
    let mut input = base_input("p");
    input.active_modes = &[ModeKind::Ralph];
    let key = compute_dedupe_key(ModeKind::Ralph, input.session_key, input.turn_id, input.source_text);
    let mut runtime = DispatchHookRuntimeState::default();
    runtime.recent_keys.insert(key, input.now_ms - 10);
    let err = evaluate_injection_guards(&cfg, &runtime, &input).unwrap_err();
    assert!(matches!(err, EngineError::DuplicateEvent));
}

#[test]
fn guard_order_cooldown_active() {
    let cfg = configured(pane_target());
    let mut input = base_input("p");
    input.active_modes = &[ModeKind::Ralph];
    let mut runtime = DispatchHookRuntimeState::default();
    runtime.last_injection_ts = Some(input.now_ms - 10);
    let err = evaluate_injection_guards(&cfg, &runtime, &input).unwrap_err();
    assert!(matches!(err, EngineError::CooldownActive));
}

#[test]
fn guard_order_pane_cap_reached_falls_back_to_session_counts() {
    let cfg = configured(pane_target());
    let mut input = base_input("p");
    input.active_modes = &[ModeKind::Ralph];
    let mut runtime = DispatchHookRuntimeState::default();
    runtime.session_counts.insert(input.session_key.to_string(), 5);
    let err = evaluate_injection_guards(&cfg, &runtime, &input).unwrap_err();
    assert!(matches!(err, EngineError::PaneCapReached));
}

#[test]
fn guard_success_returns_dedupe_key_and_target() {
    let cfg = configured(pane_target());
    let mut input = base_input("check your inbox");
    input.active_modes = &[ModeKind::Ralph];
    let runtime = DispatchHookRuntimeState::default();
    let ok = evaluate_injection_guards(&cfg, &runtime, &input).unwrap();
    assert_eq!(ok.pane_target, pane_target());
    assert_eq!(ok.prompt_text, "check your inbox");
}

#[tokio::test]
async fn send_prompt_dry_run_performs_no_io() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session("%1", true);
    let result = send_prompt(&adapter, true, "%1", "hello").await.unwrap();
    assert!(result.is_none());
    assert!(adapter.calls().is_empty());
}

#[tokio::test]
async fn send_prompt_strips_newlines_before_sending() {
    use omx_adapters::session::SessionCall;
    let adapter = FakeSessionAdapter::new();
    adapter.add_session("%1", true);
    send_prompt(&adapter, false, "%1", "line one\r\nline two").await.unwrap();
    let calls = adapter.calls();
    let literal = calls
        .iter()
        .find_map(|c| match c {
            SessionCall::SendLiteral { text, .. } => Some(text.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(literal, "line oneline two");
    let enters = calls.iter().filter(|c| matches!(c, SessionCall::SendEnter { .. })).count();
    assert_eq!(enters, 2);
}

#[tokio::test]
async fn send_and_verify_confirms_when_narrow_capture_contains_trigger() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session("%1", true);
    adapter.set_output("%1", vec!["check your inbox".to_string()]);
    let cfg = configured(pane_target());
    let outcome = send_and_verify(&adapter, &cfg, "%1", "check your inbox").await.unwrap();
    assert!(matches!(outcome, NotifyOutcome::Confirmed));
}

#[tokio::test]
async fn send_and_verify_dry_run_confirms_without_sending() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session("%1", true);
    let mut cfg = configured(pane_target());
    cfg.dry_run = true;
    let outcome = send_and_verify(&adapter, &cfg, "%1", "anything").await.unwrap();
    assert!(matches!(outcome, NotifyOutcome::Confirmed));
    assert!(adapter.calls().is_empty());
}

#[tokio::test]
async fn send_and_verify_gives_up_after_max_unconfirmed_attempts() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session("%1", true);
    let mut cfg = configured(pane_target());
    cfg.max_unconfirmed_attempts = 1;
    let outcome = send_and_verify(&adapter, &cfg, "%1", "never appears").await.unwrap();
    assert!(matches!(outcome, NotifyOutcome::Unconfirmed));
}

#[tokio::test]
async fn heal_target_falls_back_to_mode_pane_id() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session("%2", true);
    let stale = DispatchTarget::Pane { value: "%dead".to_string() };
    let healed = heal_target(&adapter, &stale, Some("%2"), None, Path::new("/work")).await.unwrap();
    assert_eq!(healed, DispatchTarget::Pane { value: "%2".to_string() });
}

#[tokio::test]
async fn heal_target_falls_back_to_cwd_matching_pane() {
    use omx_adapters::session::PaneInfo;
    let adapter = FakeSessionAdapter::new();
    adapter.set_panes(vec![PaneInfo {
        pane_id: "%3".to_string(),
        current_path: Path::new("/work").to_path_buf(),
    }]);
    let stale = DispatchTarget::Pane { value: "%dead".to_string() };
    let healed = heal_target(&adapter, &stale, None, None, Path::new("/work")).await.unwrap();
    assert_eq!(healed, DispatchTarget::Pane { value: "%3".to_string() });
}

#[tokio::test]
async fn heal_target_errors_when_nothing_matches() {
    let adapter = FakeSessionAdapter::new();
    let stale = DispatchTarget::Pane { value: "%dead".to_string() };
    let err = heal_target(&adapter, &stale, None, None, Path::new("/work")).await.unwrap_err();
    assert!(matches!(err, EngineError::PaneCwdMismatch));
}

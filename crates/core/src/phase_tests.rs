use super::*;

#[test]
fn new_state_starts_at_team_plan() {
    let state = TeamPhaseState::new(1000, 3);
    assert_eq!(state.current, PhaseOrTerminal::Phase(TeamPhase::TeamPlan));
    assert!(!state.is_terminal());
    assert_eq!(state.max_fix_attempts, 3);
    assert_eq!(state.current_fix_attempt, 0);
    assert_eq!(state.updated_at_ms, 1000);
}

#[test]
fn terminal_complete_is_terminal() {
    let mut state = TeamPhaseState::new(1000, 3);
    state.current = PhaseOrTerminal::Terminal(Terminal::Complete);
    assert!(state.is_terminal());
}

#[test]
fn phase_display_is_kebab_case() {
    assert_eq!(TeamPhase::TeamPlan.to_string(), "team-plan");
    assert_eq!(TeamPhase::TeamFix.to_string(), "team-fix");
}

use super::*;

#[test]
fn parses_valid_name() {
    let team = TeamName::parse("payments").unwrap();
    assert_eq!(team.as_str(), "payments");
}

#[test]
fn rejects_name_over_30_chars() {
    let name = "a".repeat(31);
    assert!(TeamName::parse(name).is_err());
}

#[test]
fn accepts_name_at_30_chars() {
    let name = "a".repeat(30);
    assert!(TeamName::parse(name).is_ok());
}

#[test]
fn new_team_has_no_tmux_session_until_assigned() {
    let team = Team::new(
        TeamName::parse("alpha").unwrap(),
        "ship the feature",
        "claude",
        3,
        1000,
    );
    assert_eq!(team.worker_count, 3);
    assert!(team.tmux_session.is_none());
}

//! Validation and boundary-behavior specs (§8 of the spec: boundary
//! behaviors for team name length and task id shape).

use crate::prelude::*;

#[test]
fn team_name_of_30_chars_is_accepted() {
    let project = Project::empty();
    let name = "a".repeat(30);
    project
        .omx()
        .args(&["team", "create", &name, "--task", "do the thing"])
        .passes()
        .stdout_has("created team");
}

#[test]
fn team_name_of_31_chars_is_rejected() {
    let project = Project::empty();
    let name = "a".repeat(31);
    project
        .omx()
        .args(&["team", "create", &name, "--task", "do the thing"])
        .fails()
        .stderr_has("invalid team name");
}

#[test]
fn team_name_must_start_with_alphanumeric() {
    let project = Project::empty();
    project
        .omx()
        .args(&["team", "create", "-bad", "--task", "x"])
        .fails()
        .stderr_has("invalid team name");
}

#[test]
fn task_id_of_negative_one_is_rejected() {
    let project = Project::empty();
    project
        .omx()
        .args(&["team", "create", "alpha", "--task", "do things"])
        .passes();
    project
        .omx()
        .args(&["task", "claim", "alpha", "-1", "w1"])
        .fails()
        .stderr_has("invalid task id");
}

#[test]
fn task_id_path_traversal_is_rejected() {
    let project = Project::empty();
    project
        .omx()
        .args(&["team", "create", "alpha", "--task", "do things"])
        .passes();
    project
        .omx()
        .args(&["task", "claim", "alpha", "../x", "w1"])
        .fails()
        .stderr_has("invalid task id");
}

#[test]
fn task_id_of_zero_parses_but_is_not_claimable_without_a_task() {
    let project = Project::empty();
    project
        .omx()
        .args(&["team", "create", "alpha", "--task", "do things"])
        .passes();
    // "0" is wire-shape valid (§8), so it fails as a missing/unclaimable
    // task, never as an "invalid task id" parse error.
    project
        .omx()
        .args(&["task", "claim", "alpha", "0", "w1"])
        .fails()
        .stderr_lacks("invalid task id");
}

#[test]
fn unknown_subcommand_fails() {
    cli().args(&["bogus"]).fails();
}

#[test]
fn status_for_unknown_team_reports_no_events_or_orphans() {
    let project = Project::empty();
    project
        .omx()
        .args(&["status", "nope"])
        .passes()
        .stdout_has("orphans: none");
}

#[test]
fn approval_show_for_undecided_task_fails() {
    let project = Project::empty();
    project
        .omx()
        .args(&["team", "create", "alpha", "--task", "do things"])
        .passes();
    project
        .omx()
        .args(&["approval", "show", "alpha", "1"])
        .fails()
        .stderr_has("no approval decision recorded");
}

//! End-to-end CLI scenarios drawn from §8 of the spec: exclusive-mode
//! gating, task claim/transition invariants, and mailbox queuing.

use crate::prelude::*;

#[test]
fn exclusive_mode_gate_blocks_a_second_exclusive_mode() {
    let project = Project::empty();
    project.omx().args(&["mode", "start", "ralph", "--max-iterations", "5"]).passes();

    project
        .omx()
        .args(&["mode", "start", "autopilot", "--max-iterations", "5"])
        .fails()
        .stderr_has("Cannot start: ralph is already active");

    // No autopilot-state.json should have been written.
    assert!(project.read_json(".omx/state/autopilot-state.json").is_none());
}

#[test]
fn non_exclusive_modes_can_coexist() {
    let project = Project::empty();
    project.omx().args(&["mode", "start", "ralph", "--max-iterations", "5"]).passes();
    project.omx().args(&["mode", "start", "ultraqa", "--max-iterations", "5"]).passes();

    project
        .omx()
        .args(&["mode", "list"])
        .passes()
        .stdout_has("ralph")
        .stdout_has("ultraqa");
}

#[test]
fn ralph_rejects_zero_max_iterations() {
    let project = Project::empty();
    project
        .omx()
        .args(&["mode", "start", "ralph", "--max-iterations", "0"])
        .fails();
}

#[test]
fn cancel_all_clears_every_active_mode() {
    let project = Project::empty();
    project.omx().args(&["mode", "start", "ralph", "--max-iterations", "5"]).passes();
    project.omx().args(&["mode", "start", "ultraqa", "--max-iterations", "5"]).passes();

    project.omx().args(&["mode", "cancel-all"]).passes().stdout_has("cancelled 2 mode(s)");
    project.omx().args(&["mode", "list"]).passes().stdout_has("no active modes");
}

#[test]
fn task_claim_then_complete_then_second_claim_fails() {
    let project = Project::empty();
    project.omx().args(&["team", "create", "alpha", "--task", "ship it"]).passes();
    // The per-team task counter starts at 0, so the first task created is "0".
    project.omx().args(&["task", "create", "alpha", "write the code"]).passes();

    project
        .omx()
        .args(&["task", "claim", "alpha", "0", "w1"])
        .passes()
        .stdout_has("claimed by w1");

    // A second worker cannot claim an already in-progress task.
    project.omx().args(&["task", "claim", "alpha", "0", "w2"]).fails().stderr_has("not_claimable");

    project.omx().args(&["task", "complete", "alpha", "0", "w1"]).passes().stdout_has("completed");

    // Terminal status is immutable: neither a re-claim nor a fail is
    // permitted once a task has completed (§8 testable property 3).
    project.omx().args(&["task", "claim", "alpha", "0", "w2"]).fails();
    project.omx().args(&["task", "fail", "alpha", "0", "w1"]).fails();
}

#[test]
fn blocked_task_is_not_claimable_until_its_dependency_completes() {
    let project = Project::empty();
    project.omx().args(&["team", "create", "alpha", "--task", "ship it"]).passes();
    project.omx().args(&["task", "create", "alpha", "first"]).passes(); // id "0"
    project
        .omx()
        .args(&["task", "create", "alpha", "second", "--blocked-by", "0"])
        .passes(); // id "1", blocked on "0"

    project
        .omx()
        .args(&["task", "claim", "alpha", "1", "w1"])
        .fails()
        .stderr_has("not_claimable");

    project.omx().args(&["task", "claim", "alpha", "0", "w1"]).passes();
    project.omx().args(&["task", "complete", "alpha", "0", "w1"]).passes();

    project.omx().args(&["task", "claim", "alpha", "1", "w1"]).passes().stdout_has("claimed by w1");
}

#[test]
fn mailbox_send_then_list_shows_the_message_until_delivered() {
    let project = Project::empty();
    project.omx().args(&["team", "create", "alpha", "--task", "ship it"]).passes();

    project
        .omx()
        .args(&["mailbox", "send", "alpha", "leader-fixed", "w1", "hello"])
        .passes()
        .stdout_has("sent");

    project.omx().args(&["mailbox", "list", "alpha", "w1"]).passes().stdout_has("hello");
}

#[test]
fn team_status_reports_phase_and_task_counts() {
    let project = Project::empty();
    project.omx().args(&["team", "create", "alpha", "--task", "ship it"]).passes();
    project.omx().args(&["task", "create", "alpha", "first"]).passes();

    project
        .omx()
        .args(&["team", "status", "alpha"])
        .passes()
        .stdout_has("phase:")
        .stdout_has("pending=1");
}

#[test]
fn session_start_then_end_round_trips() {
    let project = Project::empty();
    project.omx().args(&["session", "start", "--id", "sess-1"]).passes();
    project.omx().args(&["session", "status"]).passes().stdout_has("sess-1");
    project.omx().args(&["session", "end"]).passes();
    project.omx().args(&["session", "status"]).passes().stdout_has("no current session");
}

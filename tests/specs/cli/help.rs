//! CLI help output specs: every subcommand surfaces usage text.

use crate::prelude::*;

#[test]
fn no_args_shows_usage_and_fails() {
    cli().fails().stderr_has("Usage:");
}

#[test]
fn help_shows_usage() {
    cli().args(&["--help"]).passes().stdout_has("Usage:");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}

#[test]
fn team_help_shows_subcommands() {
    cli()
        .args(&["team", "--help"])
        .passes()
        .stdout_has("create")
        .stdout_has("list")
        .stdout_has("status");
}

#[test]
fn worker_help_shows_subcommands() {
    cli()
        .args(&["worker", "--help"])
        .passes()
        .stdout_has("spawn")
        .stdout_has("shutdown");
}

#[test]
fn task_help_shows_subcommands() {
    cli()
        .args(&["task", "--help"])
        .passes()
        .stdout_has("create")
        .stdout_has("claim")
        .stdout_has("complete");
}

#[test]
fn mailbox_help_shows_subcommands() {
    cli()
        .args(&["mailbox", "--help"])
        .passes()
        .stdout_has("send")
        .stdout_has("broadcast")
        .stdout_has("list");
}

#[test]
fn mode_help_shows_subcommands() {
    cli()
        .args(&["mode", "--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("cancel")
        .stdout_has("list");
}

#[test]
fn session_help_shows_subcommands() {
    cli()
        .args(&["session", "--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("end");
}

#[test]
fn daemon_help_shows_subcommands() {
    cli()
        .args(&["daemon", "--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("stop")
        .stdout_has("status");
}

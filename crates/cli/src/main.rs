// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `omx`: the operator-facing CLI over the team-dispatch coordination
//! core. Argument parsing, process exit codes, and terminal color are
//! this binary's own concern (§1 Non-goals) — every subcommand is a thin
//! wrapper over `omx-engine`/`omx-storage` calls.

mod color;
mod commands;
mod table;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{daemon, hook, mailbox, mode, session, status, task, team, worker};

#[derive(Parser)]
#[command(name = "omx", version, about = "Multi-agent team dispatch and coordination")]
struct Cli {
    /// Project root; defaults to the current directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Team provisioning and status (§4.3, §10.3).
    Team {
        #[command(subcommand)]
        cmd: team::TeamCommand,
    },
    /// Worker pane lifecycle (§4.8).
    Worker {
        #[command(subcommand)]
        cmd: worker::WorkerCommand,
    },
    /// Task CRUD, claim, and completion (§4.3).
    Task {
        #[command(subcommand)]
        cmd: task::TaskCommand,
    },
    /// Mailbox send/broadcast/list (§4.4).
    Mailbox {
        #[command(subcommand)]
        cmd: mailbox::MailboxCommand,
    },
    /// Mode lifecycle: start/cancel/list (§4.10).
    Mode {
        #[command(subcommand)]
        cmd: mode::ModeCommand,
    },
    /// Session lifecycle (§4.9).
    Session {
        #[command(subcommand)]
        cmd: session::SessionCommand,
    },
    /// `omxd` watcher process management (§4.6).
    Daemon {
        #[command(subcommand)]
        cmd: daemon::DaemonCommand,
    },
    /// Run one drain tick (the host CLI's turn-complete hook entry point).
    Hook {
        #[command(subcommand)]
        cmd: hook::HookCommand,
    },
    /// Orphaned-task sweep and event summary for a team.
    Status { team: String },
    /// Record or show a task's approval decision.
    Approval {
        #[command(subcommand)]
        cmd: status::ApprovalCommand,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Team { cmd } => team::run(cmd, cli.dir),
        Command::Worker { cmd } => worker::run(cmd, cli.dir),
        Command::Task { cmd } => task::run(cmd, cli.dir),
        Command::Mailbox { cmd } => mailbox::run(cmd, cli.dir),
        Command::Mode { cmd } => mode::run(cmd, cli.dir),
        Command::Session { cmd } => session::run(cmd, cli.dir),
        Command::Daemon { cmd } => daemon::run(cmd, cli.dir),
        Command::Hook { cmd } => hook::run(cmd, cli.dir),
        Command::Status { team } => status::run_status(team, cli.dir),
        Command::Approval { cmd } => status::run_approval(cmd, cli.dir),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `omx mode ...`: start, cancel, and list the six operating modes (§4.10).

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use omx_core::ModeKind;
use omx_engine::mode_lifecycle;
use omx_storage::Scope;

use crate::commands::common::{now_ms, parse_mode_kind, resolve_store};

fn scope(session: Option<String>) -> Scope {
    match session {
        Some(id) => Scope::Session(id),
        None => Scope::Global,
    }
}

#[derive(Subcommand)]
pub enum ModeCommand {
    /// Start a mode, failing if a conflicting exclusive mode is active.
    Start {
        #[arg(value_parser = parse_mode_kind)]
        kind: ModeKind,
        #[arg(long)]
        session: Option<String>,
        #[arg(long)]
        task_description: Option<String>,
        #[arg(long)]
        max_iterations: Option<u64>,
    },
    /// Cancel a single mode.
    Cancel {
        #[arg(value_parser = parse_mode_kind)]
        kind: ModeKind,
        #[arg(long)]
        session: Option<String>,
    },
    /// Cancel every active mode in scope.
    CancelAll {
        #[arg(long)]
        session: Option<String>,
    },
    /// List active modes in scope.
    List {
        #[arg(long)]
        session: Option<String>,
    },
}

pub fn run(cmd: ModeCommand, dir: Option<PathBuf>) -> Result<()> {
    let store = resolve_store(dir)?;

    match cmd {
        ModeCommand::Start {
            kind,
            session,
            task_description,
            max_iterations,
        } => {
            let scope = scope(session);
            let enricher = mode_lifecycle::no_op_enricher();
            let state = mode_lifecycle::start_mode(&store, kind, &scope, task_description, max_iterations, now_ms(), &enricher)?;
            println!("started {} (phase: {})", state.kind, state.current_phase);
            Ok(())
        }
        ModeCommand::Cancel { kind, session } => {
            let scope = scope(session);
            match mode_lifecycle::cancel_mode(&store, kind, &scope, now_ms())? {
                Some(state) => println!("cancelled {}", state.kind),
                None => println!("{kind} was not active"),
            }
            Ok(())
        }
        ModeCommand::CancelAll { session } => {
            let scope = scope(session);
            let cancelled = mode_lifecycle::cancel_all_modes(&store, &scope, now_ms())?;
            println!("cancelled {} mode(s)", cancelled.len());
            Ok(())
        }
        ModeCommand::List { session } => {
            let scope = scope(session);
            let modes = mode_lifecycle::list_active_modes(&store, &scope)?;
            if modes.is_empty() {
                println!("(no active modes)");
            }
            for mode in modes {
                println!("{:<10} phase={:<12} iteration={}", mode.kind.to_string(), mode.current_phase, mode.iteration);
            }
            Ok(())
        }
    }
}

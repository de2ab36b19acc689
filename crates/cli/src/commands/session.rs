// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `omx session ...`: start/end the per-directory session record that
//! scopes modes and dispatch state to one host process (§4.9).

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Subcommand;

use omx_core::SessionId;
use omx_engine::session_lifecycle;
use omx_storage::Scope;

use crate::commands::common::{now_ms, resolve_store};

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Record this process as the current session owner.
    Start {
        #[arg(long)]
        id: String,
    },
    /// Remove the current session record, logging `session_end`.
    End {
        #[arg(long)]
        id: Option<String>,
    },
    /// Print the current session id, if any, and whether it's stale.
    Status,
}

pub fn run(cmd: SessionCommand, dir: Option<PathBuf>) -> Result<()> {
    let cwd = dir.clone().map(Ok).unwrap_or_else(std::env::current_dir)?;
    let store = resolve_store(dir)?;

    match cmd {
        SessionCommand::Start { id } => {
            if let Some(reaped) = session_lifecycle::reap_stale_session(&store, now_ms())? {
                println!("reaped stale session {reaped}");
            }
            let session_id = SessionId::new(id);
            let record = session_lifecycle::write_session_start(&store, &cwd, session_id.clone(), now_ms())?;
            println!("started session {} (pid {})", session_id, record.pid);
            Ok(())
        }
        SessionCommand::End { id } => {
            let session_id = match id {
                Some(id) => SessionId::new(id),
                None => match store.current_session_scope()? {
                    Scope::Session(id) => SessionId::new(id),
                    Scope::Global => return Err(anyhow!("no current session recorded")),
                },
            };
            session_lifecycle::write_session_end(&store, &session_id, now_ms())?;
            println!("ended session {session_id}");
            Ok(())
        }
        SessionCommand::Status => {
            match store.current_session_scope()? {
                Scope::Session(id) => println!("current session: {id}"),
                Scope::Global => println!("(no current session)"),
            }
            Ok(())
        }
    }
}

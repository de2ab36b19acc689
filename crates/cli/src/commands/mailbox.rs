// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `omx send` / `omx broadcast` / `omx mailbox list`: worker-to-worker
//! messaging, queued for dispatch the next time a drain tick runs (§4.4).

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use omx_core::{IdGen, MessageId, RequestId, UuidIdGen, WorkerIdentity};
use omx_engine::messaging;

use crate::commands::common::{now_ms, parse_team, parse_worker, resolve_store};

fn worker_index(store: &omx_storage::StateStore, team: &omx_core::TeamName, worker: &omx_core::WorkerName) -> Result<u32> {
    let path = omx_storage::worker_identity_path(&store.state_root(), team.as_str(), worker.as_str())?;
    Ok(store
        .read_path::<WorkerIdentity>(&path)?
        .map(|identity| identity.index)
        .unwrap_or(0))
}

#[derive(Subcommand)]
pub enum MailboxCommand {
    /// Send a direct message and queue its dispatch.
    Send {
        team: String,
        from: String,
        to: String,
        body: String,
    },
    /// Send a message to every worker on the team except `from`.
    Broadcast {
        team: String,
        from: String,
        /// Comma-separated recipient worker names.
        to: String,
        body: String,
    },
    /// List a worker's mailbox.
    List {
        team: String,
        worker: String,
        #[arg(long)]
        include_delivered: bool,
    },
}

pub fn run(cmd: MailboxCommand, dir: Option<PathBuf>) -> Result<()> {
    let store = resolve_store(dir)?;
    let idgen = UuidIdGen;

    match cmd {
        MailboxCommand::Send { team, from, to, body } => {
            let team = parse_team(&team)?;
            let from = parse_worker(&from)?;
            let to = parse_worker(&to)?;
            let message_id = MessageId::new(idgen.next());
            let message = messaging::send(&store, &team, &from, &to, body, message_id.clone(), now_ms())?;
            let index = worker_index(&store, &team, &to)?;
            messaging::enqueue_mailbox_dispatch(
                &store,
                &team,
                &to,
                index,
                &message_id,
                format!("new message from {from}"),
                || RequestId::new(idgen.next()),
                now_ms(),
            )?;
            println!("sent {} to {}", message.id, to);
            Ok(())
        }
        MailboxCommand::Broadcast { team, from, to, body } => {
            let team = parse_team(&team)?;
            let from = parse_worker(&from)?;
            let recipients = to
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(parse_worker)
                .collect::<Result<Vec<_>>>()?;
            let sent = messaging::broadcast(&store, &team, &from, &recipients, body, || MessageId::new(idgen.next()), now_ms())?;
            for message in &sent {
                let index = worker_index(&store, &team, &message.to)?;
                messaging::enqueue_mailbox_dispatch(
                    &store,
                    &team,
                    &message.to,
                    index,
                    &message.id,
                    format!("new message from {from}"),
                    || RequestId::new(idgen.next()),
                    now_ms(),
                )?;
            }
            println!("broadcast to {} worker(s)", sent.len());
            Ok(())
        }
        MailboxCommand::List { team, worker, include_delivered } => {
            let team = parse_team(&team)?;
            let worker = parse_worker(&worker)?;
            let messages = messaging::list_mailbox(&store, &team, &worker, include_delivered)?;
            if messages.is_empty() {
                println!("(empty)");
            }
            for message in messages {
                println!("[{}] from {}: {}", message.id.short(8), message.from, message.body);
            }
            Ok(())
        }
    }
}

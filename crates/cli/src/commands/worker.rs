// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `omx worker ...`: spawn a worker pane, apply the AGENTS.md overlay and
//! initial inbox, poll readiness, and run the shutdown handshake (§4.8).
//! Optionally provisions an isolated git worktree first (§4.7).

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Subcommand;

use omx_adapters::session::SessionAdapter;
use omx_adapters::TmuxAdapter;
use omx_core::{IdGen, MessageId, RequestId, UuidIdGen, WorkerIdentity, LEADER_FIXED};
use omx_engine::{worker_glue, worktree};

use crate::commands::common::{now_ms, parse_team, parse_worker, resolve_store};

#[derive(Subcommand)]
pub enum WorkerCommand {
    /// Spawn a pane for a new worker, write its identity/inbox, and
    /// trigger the inbox dispatch.
    Spawn {
        team: String,
        worker: String,
        #[arg(long)]
        index: u32,
        #[arg(long, default_value = "implementer")]
        role: String,
        /// Working directory for the new pane; defaults to the current
        /// directory unless `--worktree` is given.
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Command to run inside the pane (the host CLI's launch argv,
        /// already resolved by the caller).
        #[arg(long)]
        cmd: String,
        /// Provision an isolated worktree for this worker first, named
        /// `<name>/<worker>` (bareword form if `--worktree` has no value).
        #[arg(long)]
        worktree: Option<Option<String>>,
    },
    /// Poll pane existence for a worker up to a bounded number of attempts.
    Ready {
        team: String,
        worker: String,
        #[arg(long, default_value_t = 15)]
        max_attempts: usize,
    },
    /// Check whether a worker's pane is currently alive.
    Alive { team: String, worker: String },
    /// Request a worker shut down, then wait for its ack (or force-kill
    /// the pane after `--max-attempts`).
    Shutdown {
        team: String,
        worker: String,
        #[arg(long, default_value_t = 15)]
        max_attempts: usize,
        #[arg(long)]
        force: bool,
    },
}

pub fn run(cmd: WorkerCommand, dir: Option<PathBuf>) -> Result<()> {
    let store = resolve_store(dir)?;
    let adapter = TmuxAdapter::new();
    let idgen = UuidIdGen;
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    match cmd {
        WorkerCommand::Spawn {
            team,
            worker,
            index,
            role,
            dir: worker_dir,
            cmd,
            worktree: worktree_flag,
        } => {
            let team = parse_team(&team)?;
            let worker = parse_worker(&worker)?;
            if worker.is_leader_fixed() {
                return Err(anyhow!("'{LEADER_FIXED}' is reserved for the team leader's mailbox"));
            }

            let cwd = worker_dir.clone().map(Ok).unwrap_or_else(std::env::current_dir)?;
            let mut working_dir = cwd.clone();
            let mut worktree_result = None;

            if let Some(name) = worktree_flag {
                let detached = name.is_none();
                let mode = omx_engine::worktree::WorktreeModeArgs {
                    enabled: true,
                    detached,
                    name,
                };
                let scope = worktree::WorktreeScope::Team {
                    worker: worker.as_str().to_string(),
                };
                let plan = runtime
                    .block_on(worktree::plan(&mode, scope, team.as_str(), &cwd))?
                    .ok_or_else(|| anyhow!("worktree planning unexpectedly disabled"))?;
                let result = runtime.block_on(worktree::ensure(&plan)).context("provisioning worktree")?;
                working_dir = result.path.clone();
                worktree_result = Some((detached, result));
            }

            let (env_key, env_val) = worker_glue::team_worker_env(&team, &worker);
            let pane_id = runtime
                .block_on(adapter.spawn(
                    &format!("{}-{}", team.as_str(), worker.as_str()),
                    &working_dir,
                    &cmd,
                    &[(env_key, env_val)],
                ))
                .context("spawning worker pane")?;

            let mut identity = WorkerIdentity::new(
                worker.clone(),
                team.clone(),
                index,
                role,
                working_dir.to_string_lossy().into_owned(),
                now_ms(),
            );
            identity.pane_id = Some(pane_id.clone());
            if let Some((detached, result)) = &worktree_result {
                identity.worktree_path = Some(result.path.to_string_lossy().into_owned());
                identity.worktree_branch = Some(result.branch.clone());
                identity.worktree_detached = Some(*detached);
            }

            let identity_path = omx_storage::worker_identity_path(&store.state_root(), team.as_str(), worker.as_str())?;
            store.write_path(&identity_path, &identity)?;

            worker_glue::write_initial_inbox_and_trigger(&store, &team, &identity, index, 0, || RequestId::new(idgen.next()), now_ms())?;

            println!("spawned {} on pane {}", worker, pane_id);
            Ok(())
        }
        WorkerCommand::Ready { team, worker, max_attempts } => {
            let team = parse_team(&team)?;
            let worker = parse_worker(&worker)?;
            let pane_id = worker_glue::worker_pane_id(&store, &team, &worker)?
                .ok_or_else(|| anyhow!("no pane recorded for {worker}"))?;
            let ready = runtime.block_on(worker_glue::wait_for_worker_ready(
                &adapter,
                &pane_id,
                max_attempts,
                std::time::Duration::from_millis(200),
            ))?;
            println!("{}", if ready { "ready" } else { "not ready" });
            Ok(())
        }
        WorkerCommand::Alive { team, worker } => {
            let team = parse_team(&team)?;
            let worker = parse_worker(&worker)?;
            let pane_id = worker_glue::worker_pane_id(&store, &team, &worker)?
                .ok_or_else(|| anyhow!("no pane recorded for {worker}"))?;
            let alive = runtime.block_on(worker_glue::is_worker_alive(&adapter, &pane_id))?;
            println!("{}", if alive { "alive" } else { "dead" });
            Ok(())
        }
        WorkerCommand::Shutdown {
            team,
            worker,
            max_attempts,
            force,
        } => {
            let team_parsed = parse_team(&team)?;
            let worker_parsed = parse_worker(&worker)?;
            let identity_path = omx_storage::worker_identity_path(&store.state_root(), team_parsed.as_str(), worker_parsed.as_str())?;
            let identity: WorkerIdentity = store
                .read_path(&identity_path)?
                .ok_or_else(|| anyhow!("no such worker: {worker}"))?;

            let message_id = MessageId::new(idgen.next());
            worker_glue::write_shutdown_inbox_and_trigger(
                &store,
                &team_parsed,
                &worker_parsed,
                identity.index,
                message_id,
                || RequestId::new(idgen.next()),
                now_ms(),
            )?;

            let Some(pane_id) = identity.pane_id.clone() else {
                println!("shutdown requested (no pane recorded)");
                return Ok(());
            };

            if force {
                let ack = runtime.block_on(worker_glue::force_shutdown(
                    &adapter,
                    &store,
                    &team_parsed,
                    &worker_parsed,
                    &pane_id,
                    max_attempts,
                    std::time::Duration::from_millis(200),
                ))?;
                match ack {
                    Some(ack) => println!("acked: {:?}", ack.status),
                    None => println!("no ack received, pane killed"),
                }
            } else {
                let ack = runtime.block_on(worker_glue::wait_for_shutdown_ack(
                    &store,
                    &team_parsed,
                    &worker_parsed,
                    max_attempts,
                    std::time::Duration::from_millis(200),
                ))?;
                match ack {
                    Some(ack) => println!("acked: {:?}", ack.status),
                    None => println!("no ack within {max_attempts} attempts"),
                }
            }
            Ok(())
        }
    }
}

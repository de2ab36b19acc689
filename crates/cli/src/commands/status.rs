// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `omx status` and `omx approval ...`: a team's orphaned-task sweep and
//! event-log summary (§10.5), and recording/reading gated-task approval
//! decisions (§4.3).

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Subcommand;

use omx_adapters::TmuxAdapter;
use omx_core::{summarize_events, ApprovalDecision, TeamEvent};
use omx_engine::{orphan, task_store};

use crate::commands::common::{now_ms, parse_task_id, parse_team, resolve_store};

#[derive(Subcommand)]
pub enum ApprovalCommand {
    /// Record an approve/reject decision for a gated task.
    Decide {
        team: String,
        task: String,
        #[arg(long)]
        approved: bool,
        #[arg(long)]
        decided_by: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// Show the recorded decision for a task, if any.
    Show { team: String, task: String },
}

pub fn run_status(team: String, dir: Option<PathBuf>) -> Result<()> {
    let store = resolve_store(dir)?;
    let team = parse_team(&team)?;

    let events_path = omx_storage::team_events_path(&store.state_root(), team.as_str())?;
    let events: Vec<TeamEvent> = store.read_jsonl(&events_path)?;
    let summary = summarize_events(&events);
    println!("events:");
    let mut kinds: Vec<_> = summary.into_iter().collect();
    kinds.sort_by_key(|(kind, _)| *kind);
    for (kind, count) in kinds {
        println!("  {kind}: {count}");
    }

    let adapter = TmuxAdapter::new();
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let orphans = runtime.block_on(orphan::detect_orphans(&store, &adapter, &team))?;
    if orphans.is_empty() {
        println!("orphans: none");
    } else {
        println!("orphans:");
        for o in orphans {
            println!(
                "  task {} owned by {} (pane {})",
                o.task,
                o.worker,
                o.pane_id.as_deref().unwrap_or("?"),
            );
        }
    }
    Ok(())
}

pub fn run_approval(cmd: ApprovalCommand, dir: Option<PathBuf>) -> Result<()> {
    let store = resolve_store(dir)?;

    match cmd {
        ApprovalCommand::Decide {
            team,
            task,
            approved,
            decided_by,
            note,
        } => {
            let team = parse_team(&team)?;
            let task_id = parse_task_id(&task)?;
            let decision = ApprovalDecision {
                task: task_id.clone(),
                approved,
                decided_by,
                decided_at_ms: now_ms(),
                note,
            };
            task_store::write_approval(&store, &team, &decision)?;
            println!("recorded {} decision for {}", if approved { "approve" } else { "reject" }, task_id);
            Ok(())
        }
        ApprovalCommand::Show { team, task } => {
            let team = parse_team(&team)?;
            let task_id = parse_task_id(&task)?;
            match task_store::read_approval(&store, &team, &task_id)? {
                Some(decision) => {
                    println!(
                        "{}: {} by {} at {}{}",
                        task_id,
                        if decision.approved { "approved" } else { "rejected" },
                        decision.decided_by,
                        decision.decided_at_ms,
                        decision.note.map(|n| format!(" ({n})")).unwrap_or_default(),
                    );
                    Ok(())
                }
                None => Err(anyhow!("no approval decision recorded for {task_id}")),
            }
        }
    }
}

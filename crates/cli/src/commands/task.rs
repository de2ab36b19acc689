// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `omx task ...`: create, list, claim, and finish tasks (§4.3).

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use omx_core::TaskStatus;
use omx_engine::task_store;

use crate::commands::common::{now_ms, parse_task_id, parse_task_ids, parse_team, parse_worker, resolve_store};
use crate::table::{Column, Table};

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Create a task, optionally blocked on other task ids.
    Create {
        team: String,
        subject: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Comma-separated task ids this task is blocked on.
        #[arg(long, default_value = "")]
        blocked_by: String,
    },
    /// List every task for a team.
    List { team: String },
    /// Claim a task for a worker.
    Claim { team: String, task: String, worker: String },
    /// Mark a claimed task completed.
    Complete {
        team: String,
        task: String,
        worker: String,
        #[arg(long)]
        result: Option<String>,
    },
    /// Mark a claimed task failed.
    Fail {
        team: String,
        task: String,
        worker: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Print the next claimable task for a worker, if any.
    Next { team: String, worker: String },
}

pub fn run(cmd: TaskCommand, dir: Option<PathBuf>) -> Result<()> {
    let store = resolve_store(dir)?;

    match cmd {
        TaskCommand::Create {
            team,
            subject,
            description,
            blocked_by,
        } => {
            let team = parse_team(&team)?;
            let blocked_by = parse_task_ids(&blocked_by)?;
            let task = task_store::create_task(&store, &team, subject, description, blocked_by, now_ms())?;
            println!("created task {} ({})", task.id, task.status);
            Ok(())
        }
        TaskCommand::List { team } => {
            let team = parse_team(&team)?;
            let tasks = task_store::list_tasks(&store, &team)?;
            let mut table = Table::new(vec![
                Column::left("ID"),
                Column::status("STATUS"),
                Column::left("OWNER"),
                Column::left("SUBJECT").with_max(60),
            ]);
            for task in &tasks {
                table.row(vec![
                    task.id.as_str().to_string(),
                    task.status.to_string(),
                    task.owner.as_ref().map(|o| o.as_str().to_string()).unwrap_or_default(),
                    task.subject.clone(),
                ]);
            }
            let mut out = std::io::stdout();
            table.render(&mut out);
            let _ = out.flush();
            Ok(())
        }
        TaskCommand::Claim { team, task, worker } => {
            let team = parse_team(&team)?;
            let task_id = parse_task_id(&task)?;
            let worker = parse_worker(&worker)?;
            let claimed = task_store::claim_task(&store, &team, &task_id, &worker, now_ms())?;
            println!("{} claimed by {}", claimed.id, worker);
            Ok(())
        }
        TaskCommand::Complete {
            team,
            task,
            worker,
            result,
        } => {
            let team = parse_team(&team)?;
            let task_id = parse_task_id(&task)?;
            let worker = parse_worker(&worker)?;
            task_store::update_status(&store, &team, &task_id, &worker, TaskStatus::Completed, result, now_ms())?;
            println!("{} completed", task_id);
            Ok(())
        }
        TaskCommand::Fail { team, task, worker, reason } => {
            let team = parse_team(&team)?;
            let task_id = parse_task_id(&task)?;
            let worker = parse_worker(&worker)?;
            task_store::update_status(&store, &team, &task_id, &worker, TaskStatus::Failed, reason, now_ms())?;
            println!("{} failed", task_id);
            Ok(())
        }
        TaskCommand::Next { team, worker } => {
            let team = parse_team(&team)?;
            let worker = parse_worker(&worker)?;
            match task_store::next_claimable_task(&store, &team, &worker)? {
                Some(task) => println!("{} {}", task.id, task.subject),
                None => println!("(no claimable task)"),
            }
            Ok(())
        }
    }
}

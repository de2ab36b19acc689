// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `omx team ...`: provision teams from a declarative HCL file or ad hoc
//! flags, list them, and show a team's current phase/task summary.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Subcommand;

use omx_core::{Team, TeamPhaseState};
use omx_engine::{phase_controller, task_store, team_config};

use crate::color;
use crate::commands::common::{now_ms, parse_team, resolve_store};
use crate::table::{Column, Table};

#[derive(Subcommand)]
pub enum TeamCommand {
    /// Create a team directly from flags.
    Create {
        name: String,
        #[arg(long)]
        task: String,
        #[arg(long, default_value = "claude")]
        agent_type: String,
        #[arg(long, default_value_t = 1)]
        worker_count: u32,
    },
    /// Load one team definition out of an HCL file (§10.3) and provision it.
    Load {
        /// Path to an HCL file containing one or more `team "<name>" { ... }` blocks.
        file: PathBuf,
        /// Which team block to provision.
        #[arg(long = "name")]
        team_name: String,
    },
    /// List every team with state under this project.
    List,
    /// Show a team's current phase, task counts, and worker count.
    Status { name: String },
}

pub fn run(cmd: TeamCommand, dir: Option<PathBuf>) -> Result<()> {
    let store = resolve_store(dir)?;

    match cmd {
        TeamCommand::Create {
            name,
            task,
            agent_type,
            worker_count,
        } => {
            let team_name = parse_team(&name)?;
            let team = Team::new(team_name.clone(), task, agent_type, worker_count, now_ms());
            let path = omx_storage::team_config_path(&store.state_root(), team_name.as_str())?;
            store.write_path(&path, &team)?;
            tracing::info!(team = team_name.as_str(), "team created");
            println!("created team {}", team_name);
            Ok(())
        }
        TeamCommand::Load { file, team_name } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let defs = team_config::parse_team_defs(&source)?;
            let def = team_config::find_team_def(&defs, &team_name)
                .ok_or_else(|| anyhow!("no team block named '{team_name}' in {}", file.display()))?;
            let name = parse_team(&team_name)?;
            let team = Team::new(name.clone(), def.task.clone(), def.agent_type.clone(), def.worker_count, now_ms());
            let path = omx_storage::team_config_path(&store.state_root(), name.as_str())?;
            store.write_path(&path, &team)?;
            println!("provisioned team {} from {}", name, file.display());
            Ok(())
        }
        TeamCommand::List => {
            let names = store.list_teams()?;
            let mut table = Table::new(vec![
                Column::left("TEAM"),
                Column::left("TASK").with_max(60),
                Column::right("WORKERS"),
            ]);
            for name in &names {
                let path = omx_storage::team_config_path(&store.state_root(), name)?;
                if let Some(team) = store.read_path::<Team>(&path)? {
                    table.row(vec![name.clone(), team.task, team.worker_count.to_string()]);
                }
            }
            let mut out = std::io::stdout();
            table.render(&mut out);
            let _ = out.flush();
            Ok(())
        }
        TeamCommand::Status { name } => {
            let team_name = parse_team(&name)?;
            let path = omx_storage::team_config_path(&store.state_root(), team_name.as_str())?;
            let team = store
                .read_path::<Team>(&path)?
                .ok_or_else(|| anyhow!("no such team: {team_name}"))?;

            let tasks = task_store::list_tasks(&store, &team_name)?;
            let counts = phase_controller::TaskCounts {
                pending: tasks.iter().filter(|t| t.status == omx_core::TaskStatus::Pending).count() as u64,
                blocked: tasks.iter().filter(|t| t.status == omx_core::TaskStatus::Blocked).count() as u64,
                in_progress: tasks.iter().filter(|t| t.status == omx_core::TaskStatus::InProgress).count() as u64,
                failed: tasks.iter().filter(|t| t.status == omx_core::TaskStatus::Failed).count() as u64,
            };
            let phase: TeamPhaseState = phase_controller::reconcile_and_persist(&store, team_name.as_str(), &counts, false, now_ms())?;

            println!("{}", color::apply_header(&format!("team {}", team_name)));
            println!("  task:    {}", team.task);
            println!("  agent:   {}", team.agent_type);
            println!("  workers: {}", team.worker_count);
            println!("  phase:   {}", color::apply_status(&format!("{:?}", phase.current)));
            println!(
                "  tasks:   pending={} blocked={} in_progress={} failed={} completed={}",
                counts.pending,
                counts.blocked,
                counts.in_progress,
                counts.failed,
                tasks.iter().filter(|t| t.status == omx_core::TaskStatus::Completed).count(),
            );
            Ok(())
        }
    }
}

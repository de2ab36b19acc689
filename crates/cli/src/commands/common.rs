// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared plumbing for the command modules: store resolution, the current
//! time, and small value parsers clap needs that the domain types don't
//! carry themselves (they're core types, not CLI-facing ones).

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use omx_core::{Clock, ModeKind, SystemClock, TaskId, TeamName, WorkerName};
use omx_storage::StateStore;

/// Resolve the state store for the project rooted at `dir` (default: the
/// current working directory).
pub fn resolve_store(dir: Option<PathBuf>) -> Result<StateStore> {
    let root = match dir {
        Some(d) => d,
        None => std::env::current_dir().context("resolving current directory")?,
    };
    Ok(StateStore::new(root))
}

pub fn now_ms() -> u64 {
    SystemClock.epoch_ms()
}

pub fn parse_team(name: &str) -> Result<TeamName> {
    TeamName::parse(name).map_err(|e| anyhow!("invalid team name '{name}': {e}"))
}

pub fn parse_worker(name: &str) -> Result<WorkerName> {
    WorkerName::parse(name).map_err(|e| anyhow!("invalid worker name '{name}': {e}"))
}

pub fn parse_task_id(id: &str) -> Result<TaskId> {
    TaskId::parse(id).map_err(|e| anyhow!("invalid task id '{id}': {e}"))
}

/// clap `value_parser` for [`ModeKind`]; the type itself stays a plain
/// domain enum rather than growing a CLI-specific derive.
pub fn parse_mode_kind(s: &str) -> Result<ModeKind, String> {
    match s {
        "autopilot" => Ok(ModeKind::Autopilot),
        "ralph" => Ok(ModeKind::Ralph),
        "ultrawork" => Ok(ModeKind::Ultrawork),
        "team" => Ok(ModeKind::Team),
        "ultraqa" => Ok(ModeKind::Ultraqa),
        "ralplan" => Ok(ModeKind::Ralplan),
        other => Err(format!(
            "unknown mode '{other}' (expected one of: autopilot, ralph, ultrawork, team, ultraqa, ralplan)"
        )),
    }
}

pub fn parse_task_ids(csv: &str) -> Result<Vec<TaskId>> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_task_id)
        .collect()
}

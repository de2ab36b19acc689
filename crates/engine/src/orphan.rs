// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orphan detection (§10.5 of the expanded spec): a read-only status sweep
//! over a team's in-progress tasks, flagging any whose owning worker's pane
//! has died. This never mutates state — it is a diagnostic for `status`
//! surfaces, not a recovery mechanism (recovery is a human or leader
//! decision, made through the normal task/mode APIs).

use serde::{Deserialize, Serialize};

use omx_adapters::session::SessionAdapter;
use omx_core::{TaskId, TeamName, WorkerName};
use omx_storage::StateStore;

use crate::error::EngineError;
use crate::task_store;
use crate::worker_glue;

/// One in-progress task whose owning worker's pane is no longer alive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrphanedTask {
    pub task: TaskId,
    pub worker: WorkerName,
    pub pane_id: Option<String>,
}

/// Find every in-progress task in `team` whose owner's pane has died.
/// A task owned by a worker with no recorded pane id (never spawned
/// through the pane lifecycle, e.g. a worker driven by a different
/// transport) is not considered orphaned — there's nothing to check.
pub async fn detect_orphans<A: SessionAdapter>(
    store: &StateStore,
    adapter: &A,
    team: &TeamName,
) -> Result<Vec<OrphanedTask>, EngineError> {
    let tasks = task_store::list_tasks(store, team)?;
    let mut orphans = Vec::new();

    for task in tasks
        .into_iter()
        .filter(|t| matches!(t.status, omx_core::TaskStatus::InProgress))
    {
        let Some(owner) = task.owner.clone() else {
            continue;
        };
        let Some(pane_id) = worker_glue::worker_pane_id(store, team, &owner)? else {
            continue;
        };
        if !worker_glue::is_worker_alive(adapter, &pane_id).await? {
            orphans.push(OrphanedTask {
                task: task.id,
                worker: owner,
                pane_id: Some(pane_id),
            });
        }
    }

    Ok(orphans)
}

#[cfg(test)]
#[path = "orphan_tests.rs"]
mod tests;

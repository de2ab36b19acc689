// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative team/worker launch definitions (§10.3 of the expanded
//! spec): teams are launched from an HCL file under the project root,
//! not hand-built JSON. This is the ambient configuration layer the
//! distilled data model names only as the persisted `Team`/`config.json`
//! shape (§3) — this module is how an operator authors one before it
//! ever becomes state.
//!
//! ```hcl
//! team "alpha" {
//!   task        = "migrate the billing module to the new schema"
//!   agent_type  = "claude"
//!   worker_count = 3
//!   overlay     = "Prefer small, reviewable commits."
//! }
//! ```

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

fn default_agent_type() -> String {
    "claude".to_string()
}

fn default_worker_count() -> u32 {
    1
}

/// One `team` block: everything needed to provision a team before any
/// state exists for it.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamDef {
    pub task: String,
    #[serde(default = "default_agent_type")]
    pub agent_type: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: u32,
    /// Extra text appended to the worker overlay block (§4.8), e.g.
    /// project-specific conventions the leader wants every worker to see.
    #[serde(default)]
    pub overlay: Option<String>,
}

/// The top-level shape of a team definitions file: one `team "<name>" {
/// ... }` block per team.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamDefsFile {
    #[serde(default, alias = "team")]
    pub teams: HashMap<String, TeamDef>,
}

#[derive(Debug, Error)]
pub enum TeamConfigError {
    #[error("HCL parse error: {0}")]
    Hcl(#[from] hcl::Error),
}

/// Parse a team definitions file from HCL source.
pub fn parse_team_defs(source: &str) -> Result<TeamDefsFile, TeamConfigError> {
    hcl::from_str(source).map_err(TeamConfigError::from)
}

/// Look up a single team definition by name.
pub fn find_team_def<'a>(file: &'a TeamDefsFile, name: &str) -> Option<&'a TeamDef> {
    file.teams.get(name)
}

#[cfg(test)]
#[path = "team_config_tests.rs"]
mod tests;

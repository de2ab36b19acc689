// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker identifier and identity.
//!
//! A worker name matches `^[a-z0-9][a-z0-9-]{0,63}$` (64 characters max).
//! The name `leader-fixed` is reserved for the team's fixed leader worker
//! and cannot be claimed by a dynamically spawned worker.

use serde::{Deserialize, Serialize};

use crate::validate::{validate_slug, SlugError};

crate::define_id! {
    /// Unique identifier for a worker instance.
    pub struct WorkerId;
}

const MAX_WORKER_NAME_LEN: usize = 64;

/// The reserved name for a team's fixed leader worker.
pub const LEADER_FIXED: &str = "leader-fixed";

/// A validated worker name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerName(String);

impl WorkerName {
    pub fn parse(name: impl Into<String>) -> Result<Self, SlugError> {
        let name = name.into();
        validate_slug(&name, MAX_WORKER_NAME_LEN)?;
        Ok(Self(name))
    }

    /// Parse a name that is allowed to be `leader-fixed` as well as an
    /// ordinary worker slug; callers claiming a *new* dynamic worker should
    /// use [`WorkerName::parse`] and separately reject `leader-fixed`.
    pub fn parse_reserved_ok(name: impl Into<String>) -> Result<Self, SlugError> {
        Self::parse(name)
    }

    pub fn is_leader_fixed(&self) -> bool {
        self.0 == LEADER_FIXED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for WorkerName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A worker's declared identity within a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerIdentity {
    pub name: WorkerName,
    pub team: crate::team::TeamName,
    pub index: u32,
    pub role: String,
    #[serde(default)]
    pub assigned_tasks: Vec<crate::task::TaskId>,
    pub working_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_detached: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_state_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pane_id: Option<String>,
    pub created_at_ms: u64,
}

impl WorkerIdentity {
    pub fn new(
        name: WorkerName,
        team: crate::team::TeamName,
        index: u32,
        role: impl Into<String>,
        working_dir: impl Into<String>,
        created_at_ms: u64,
    ) -> Self {
        Self {
            name,
            team,
            index,
            role: role.into(),
            assigned_tasks: Vec::new(),
            working_dir: working_dir.into(),
            worktree_path: None,
            worktree_branch: None,
            worktree_detached: None,
            team_state_root: None,
            pane_id: None,
            created_at_ms,
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;

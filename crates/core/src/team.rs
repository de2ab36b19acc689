// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Team identity.
//!
//! A team name matches `^[a-z0-9][a-z0-9-]{0,29}$` (30 characters max) and
//! doubles as the path segment under which the team's state lives.

use serde::{Deserialize, Serialize};

use crate::validate::{validate_slug, SlugError};

const MAX_TEAM_NAME_LEN: usize = 30;

/// A validated team name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamName(String);

impl TeamName {
    pub fn parse(name: impl Into<String>) -> Result<Self, SlugError> {
        let name = name.into();
        validate_slug(&name, MAX_TEAM_NAME_LEN)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TeamName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for TeamName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A team's declared identity and creation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub name: TeamName,
    pub task: String,
    pub agent_type: String,
    pub worker_count: u32,
    pub created_at_ms: u64,
    /// Multiplexer session the team's panes live in (§4.8).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmux_session: Option<String>,
    /// Git worktree this team was provisioned into, if any (§4.7).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_path: Option<std::path::PathBuf>,
}

impl Team {
    pub fn new(
        name: TeamName,
        task: impl Into<String>,
        agent_type: impl Into<String>,
        worker_count: u32,
        created_at_ms: u64,
    ) -> Self {
        Self {
            name,
            task: task.into(),
            agent_type: agent_type.into(),
            worker_count,
            created_at_ms,
            tmux_session: None,
            worktree_path: None,
        }
    }
}

#[cfg(test)]
#[path = "team_tests.rs"]
mod tests;

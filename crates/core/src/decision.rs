// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Approval decisions keyed by task id: an append-only record of whether a
//! gated task was approved to proceed, who decided, and when.

use serde::{Deserialize, Serialize};

use crate::task::TaskId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub task: TaskId,
    pub approved: bool,
    pub decided_by: String,
    pub decided_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;

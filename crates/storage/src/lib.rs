// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! omx-storage: the on-disk state tree — atomic JSON state files, advisory
//! locking for counters, and daily structured logs.

mod lock;
mod log_writer;
mod paths;
mod state_store;

pub use lock::with_file_lock;
pub use log_writer::{append_daily_log, list_daily_logs, rotate_daily_log, LogWriterError};
pub use paths::{
    daily_log_path, dispatch_dir, dispatch_request_path, leader_nudge_state_path, mailbox_dir,
    mailbox_path, mode_state_path, omx_root, session_history_path, session_hud_state_path,
    session_metrics_path, session_mode_state_path, session_pointer_path, sessions_dir, state_root,
    task_counter_path, task_path, tasks_dir, team_config_path, team_dir, team_events_path,
    team_phase_state_path, teams_dir, tmux_hook_config_path, tmux_hook_state_path, validate_kind,
    validate_session_id, worker_dir, worker_heartbeat_path, worker_identity_path,
    worker_inbox_path, worker_shutdown_ack_path, worker_status_path, PathError,
};
pub use state_store::{resolve_working_dir_impl, Scope, StateStore, StateStoreError};

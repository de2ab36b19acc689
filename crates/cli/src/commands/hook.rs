// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `omx hook notify`: the single entry point the host CLI's turn-complete
//! hook calls on every turn. Resolves the dispatch config, runs one drain
//! tick, and reports what happened (§4.6).

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use omx_adapters::TmuxAdapter;
use omx_core::DispatchHookConfig;
use omx_engine::dispatch_engine;
use omx_engine::drainer;

use crate::commands::common::now_ms;

#[derive(Subcommand)]
pub enum HookCommand {
    /// Run one drain tick: advance active modes, sync linked terminals, and
    /// (leader only) drain queued dispatch requests into their panes.
    Notify {
        #[arg(long)]
        session: Option<String>,
    },
}

pub fn run(cmd: HookCommand, dir: Option<PathBuf>) -> Result<()> {
    let cwd = dir.map(Ok).unwrap_or_else(std::env::current_dir)?;

    match cmd {
        HookCommand::Notify { session } => {
            let store = drainer::resolve_store(&cwd);
            let config_path = omx_storage::tmux_hook_config_path(&cwd);
            let raw: DispatchHookConfig = std::fs::read_to_string(&config_path)
                .ok()
                .and_then(|text| serde_json::from_str(&text).ok())
                .unwrap_or_default();
            let config = dispatch_engine::normalize_config(&raw);
            let adapter = TmuxAdapter::new();
            let is_leader = drainer::is_leader();

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let report = runtime.block_on(drainer::drain_tick(
                &store,
                &adapter,
                &config,
                is_leader,
                session.as_deref(),
                now_ms(),
            ));

            println!(
                "modes_advanced={} modes_completed={} dispatch_processed={} dispatch_skipped={} dispatch_failed={}",
                report.modes_advanced,
                report.modes_completed,
                report.dispatch.processed,
                report.dispatch.skipped,
                report.dispatch.failed,
            );
            Ok(())
        }
    }
}

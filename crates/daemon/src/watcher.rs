// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fallback watcher (§4.6): a companion process that calls the same
//! drain tick the host CLI's turn-complete hook calls, on a poll interval,
//! for projects where the hook isn't wired up or a tick was missed. Both
//! share idempotency purely through dispatch request and mode state, so
//! running the watcher alongside the hook is harmless, not just tolerated.

use std::path::{Path, PathBuf};
use std::time::Duration;

use omx_adapters::session::SessionAdapter;
use omx_core::{Clock, DispatchHookConfig, SystemClock};
use omx_engine::{daily_log, dispatch_engine, drainer};
use omx_storage::StateStore;

/// One watcher's configuration: the project it drains and how often.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub project_root: PathBuf,
    pub poll_interval: Duration,
    pub log_retention_days: u32,
}

impl WatcherConfig {
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            poll_interval: omx_adapters::env::drainer_poll_ms(),
            log_retention_days: omx_adapters::env::log_retention_days(),
        }
    }
}

/// Run one drain tick against `config.project_root` and sweep stale daily
/// logs. The watcher always acts as leader: it is one process per project
/// directory, not per worker pane (§4.6 step 1 assigns leader-vs-worker
/// roles by `OMX_TEAM_WORKER`, which a worker pane's *own* host CLI
/// process sets — this watcher process never runs inside a worker pane).
pub async fn tick<A: SessionAdapter>(config: &WatcherConfig, adapter: &A, now_ms: u64) -> drainer::DrainTickReport {
    let store = StateStore::new(config.project_root.clone());
    let config_path = omx_storage::tmux_hook_config_path(&config.project_root);
    let raw: DispatchHookConfig = std::fs::read_to_string(&config_path)
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default();
    let normalized = dispatch_engine::normalize_config(&raw);

    let report = drainer::drain_tick(&store, adapter, &normalized, true, None, now_ms).await;
    sweep_logs(&config.project_root, config.log_retention_days, now_ms);
    report
}

/// Compress every daily log older than the retention window into a
/// `.jsonl.zst` archive, skipping today's (still-being-appended-to) file.
/// Individual failures are warnings, never fatal (§7).
fn sweep_logs(project_root: &Path, retention_days: u32, now_ms: u64) {
    let Ok(logs) = omx_storage::list_daily_logs(project_root) else {
        return;
    };
    let cutoff_ms = now_ms.saturating_sub(u64::from(retention_days) * 86_400_000);
    let cutoff_date = daily_log::format_date(cutoff_ms);
    let today = daily_log::format_date(now_ms);

    for path in logs {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(date) = stem.strip_prefix("omx-") else {
            continue;
        };
        if date >= today.as_str() || date >= cutoff_date.as_str() {
            continue;
        }
        match omx_storage::rotate_daily_log(&path) {
            Ok(archive) => tracing::info!(path = %archive.display(), "rotated stale daily log"),
            Err(e) => tracing::warn!(error = %e, path = %path.display(), "failed to rotate daily log"),
        }
    }
}

/// Run ticks forever at `config.poll_interval` until `shutdown` resolves.
/// Each tick's report is logged at debug level; failures inside a tick are
/// already absorbed by `drain_tick` itself (§7).
pub async fn run_until<A: SessionAdapter>(config: WatcherConfig, adapter: A, mut shutdown: impl std::future::Future<Output = ()> + Unpin) {
    tracing::info!(project = %config.project_root.display(), poll_ms = config.poll_interval.as_millis() as u64, "watcher starting");
    let clock = SystemClock;
    loop {
        let now = clock.epoch_ms();
        let report = tick(&config, &adapter, now).await;
        tracing::debug!(
            modes_advanced = report.modes_advanced,
            modes_completed = report.modes_completed,
            dispatch_processed = report.dispatch.processed,
            dispatch_skipped = report.dispatch.skipped,
            dispatch_failed = report.dispatch.failed,
            "watcher tick complete"
        );

        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("watcher shutting down");
                return;
            }
            _ = tokio::time::sleep(config.poll_interval) => {}
        }
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;

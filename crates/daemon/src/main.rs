// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! omxd: the fallback watcher process.
//!
//! Spawned detached by `omx daemon start` with stdio nulled, so all
//! diagnostics go to a log file under the project's `.omx` tree rather
//! than stdout/stderr (§10.1).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;

use clap::Parser;
use omx_adapters::session::TmuxAdapter;
use omx_daemon::watcher::{self, WatcherConfig};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

#[derive(Parser)]
#[command(name = "omxd", version, about = "Fallback watcher for omx team dispatch")]
struct Args {
    /// Project root to watch; `.omx/state` and `.omx/logs` live under it.
    #[arg(long = "directory")]
    directory: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _log_guard = setup_logging(&args.directory)?;

    info!(project = %args.directory.display(), pid = std::process::id(), "omxd starting");

    let config = WatcherConfig::new(args.directory.clone());
    let adapter = TmuxAdapter::new();

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let shutdown = Box::pin(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
    });

    watcher::run_until(config, adapter, shutdown).await;

    info!("omxd stopped");
    Ok(())
}

/// Logs append to `<project>/.omx/logs/omxd.log`; the daily-log rotation
/// the watcher itself performs handles its own structured JSONL separately
/// (§10.1 covers this file only — operational diagnostics, not the team
/// event log).
fn setup_logging(project_root: &std::path::Path) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = omx_storage::omx_root(project_root).join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "omxd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

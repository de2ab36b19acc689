// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `omx daemon ...`: manage the background `omxd` watcher as a detached
//! subprocess, tracked by a PID file under the project's `.omx` directory.
//! The CLI never links against the daemon binary directly — only against
//! this lifecycle plumbing — so `omxd` can be replaced or run out-of-band
//! without touching the CLI's dependency graph.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Subcommand;

use crate::commands::common::resolve_store;

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Spawn `omxd` detached, writing its pid to `.omx/omxd.pid`.
    Start,
    /// Send `SIGTERM` to the recorded pid and remove the pid file.
    Stop,
    /// Report whether the recorded pid is alive.
    Status,
}

fn pid_file(dir: &Option<PathBuf>) -> Result<PathBuf> {
    let store = resolve_store(dir.clone())?;
    Ok(omx_storage::omx_root(&store.project_root()).join("omxd.pid"))
}

fn pid_is_alive(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{pid}")).exists()
}

pub fn run(cmd: DaemonCommand, dir: Option<PathBuf>) -> Result<()> {
    let pid_path = pid_file(&dir)?;

    match cmd {
        DaemonCommand::Start => {
            if let Some(existing) = std::fs::read_to_string(&pid_path).ok().and_then(|s| s.trim().parse::<u32>().ok()) {
                if pid_is_alive(existing) {
                    println!("omxd already running (pid {existing})");
                    return Ok(());
                }
            }
            let project_root = resolve_store(dir)?.project_root().to_path_buf();
            let child = std::process::Command::new("omxd")
                .arg("--directory")
                .arg(&project_root)
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .spawn()
                .context("spawning omxd")?;
            if let Some(parent) = pid_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&pid_path, child.id().to_string())?;
            println!("started omxd (pid {})", child.id());
            Ok(())
        }
        DaemonCommand::Stop => {
            let pid: u32 = std::fs::read_to_string(&pid_path)
                .with_context(|| format!("reading {}", pid_path.display()))?
                .trim()
                .parse()
                .context("parsing recorded omxd pid")?;
            let status = std::process::Command::new("kill").arg(pid.to_string()).status().context("sending SIGTERM to omxd")?;
            let _ = std::fs::remove_file(&pid_path);
            if status.success() {
                println!("stopped omxd (pid {pid})");
                Ok(())
            } else {
                Err(anyhow!("kill exited with {status}"))
            }
        }
        DaemonCommand::Status => {
            match std::fs::read_to_string(&pid_path).ok().and_then(|s| s.trim().parse::<u32>().ok()) {
                Some(pid) if pid_is_alive(pid) => println!("running (pid {pid})"),
                Some(pid) => println!("stale pid file (pid {pid} not alive)"),
                None => println!("not running"),
            }
            Ok(())
        }
    }
}

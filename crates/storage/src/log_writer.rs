// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daily structured JSONL log append, and rotation of stale daily logs
//! into zstd-compressed archives rather than deletion.
//!
//! Callers treat append/rotation failures as warnings (§7): the drainer
//! never aborts a tick because logging failed.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::paths::daily_log_path;

#[derive(Debug, Error)]
pub enum LogWriterError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("compression error: {0}")]
    Compress(String),
}

/// Append one structured log line to `<project>/.omx/logs/omx-<date>.jsonl`.
pub fn append_daily_log<T: Serialize>(
    project_root: &Path,
    date: &str,
    record: &T,
) -> Result<(), LogWriterError> {
    let path = daily_log_path(project_root, date);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    file.write_all(&line)?;
    Ok(())
}

/// Compress a daily log older than the retention window into `<path>.zst`
/// and remove the plaintext original. Never deletes without a successful
/// compressed replacement.
pub fn rotate_daily_log(path: &Path) -> Result<PathBuf, LogWriterError> {
    let data = std::fs::read(path)?;
    let compressed = zstd::encode_all(data.as_slice(), 3).map_err(|e| LogWriterError::Compress(e.to_string()))?;
    let archive_path = path.with_extension("jsonl.zst");
    std::fs::write(&archive_path, compressed)?;
    std::fs::remove_file(path)?;
    Ok(archive_path)
}

/// Dates (by filename) of daily logs present under `<project>/.omx/logs`,
/// oldest first, for a retention sweep to iterate.
pub fn list_daily_logs(project_root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let dir = crate::paths::omx_root(project_root).join("logs");
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "jsonl").unwrap_or(false))
        .collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
#[path = "log_writer_tests.rs"]
mod tests;

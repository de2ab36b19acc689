// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory file locking for counter-style read-modify-write updates
//! (dispatch runtime state, mailbox `notified_at`) shared across processes
//! through the file system rather than in-memory primitives.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use fs2::FileExt;

/// Take an exclusive advisory lock on `path` (creating it if needed) for
/// the duration of `f`, then release it. The lock is scoped to the file,
/// not the process, so it serializes concurrent writers across processes.
pub fn with_file_lock<T>(path: &Path, f: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let lock_path = lock_path_for(path);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)?;
    file.lock_exclusive()?;
    let result = f();
    FileExt::unlock(&file)?;
    result
}

fn lock_path_for(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(".lock");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;

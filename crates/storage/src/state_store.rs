// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Direct, non-event-sourced JSON state store: every entity is its own
//! file, written atomically (write-temp-then-rename) and read back as-is.
//!
//! This deliberately does not replay an event log. The upstream WAL +
//! `MaterializedState::apply_event` design this crate used to carry fit a
//! job-queue daemon that needed crash-consistent in-memory reconstruction;
//! it does not fit a tree of independently-owned JSON files read by
//! external tools (§6 of the state tree contract). Each `read`/`write` here
//! is a single file's worth of state, scoped by the caller.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use omx_core::{Classify, ErrorKind};

use crate::paths::{self, PathError};

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("malformed state at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("working dir outside allowed roots: {0}")]
    OutsideAllowedRoots(String),
}

impl Classify for StateStoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StateStoreError::Path(e) => e.kind(),
            StateStoreError::Malformed { .. } => ErrorKind::StateIo,
            StateStoreError::Io { .. } => ErrorKind::StateIo,
            StateStoreError::InvalidInput(_) => ErrorKind::Validation,
            StateStoreError::OutsideAllowedRoots(_) => ErrorKind::Validation,
        }
    }
}

/// Which scope a state operation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Global,
    Session(String),
}

/// Atomic, path-validated JSON state store rooted at a single project's
/// `.omx/state` tree.
#[derive(Debug, Clone)]
pub struct StateStore {
    project_root: PathBuf,
}

impl StateStore {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn state_root(&self) -> PathBuf {
        paths::state_root(&self.project_root)
    }

    /// Read a mode/entity's state for the given scope. Returns `Ok(None)`
    /// if the file does not exist (readers tolerate missing files).
    pub fn read<T: DeserializeOwned>(
        &self,
        kind: &str,
        scope: &Scope,
    ) -> Result<Option<T>, StateStoreError> {
        let path = self.path_for(kind, scope)?;
        read_json_opt(&path)
    }

    /// Write a mode/entity's state for the given scope, atomically.
    pub fn write<T: Serialize>(
        &self,
        kind: &str,
        scope: &Scope,
        value: &T,
    ) -> Result<(), StateStoreError> {
        let path = self.path_for(kind, scope)?;
        write_json_atomic(&path, value)
    }

    fn path_for(&self, kind: &str, scope: &Scope) -> Result<PathBuf, StateStoreError> {
        let root = self.state_root();
        let path = match scope {
            Scope::Global => paths::mode_state_path(&root, kind)?,
            Scope::Session(session_id) => {
                paths::session_mode_state_path(&root, session_id, kind)?
            }
        };
        Ok(path)
    }

    /// All scopes (global + every session) that currently have a file for
    /// `kind`, for union-scope readers (status/monitoring, §4.1).
    pub fn list_scopes(&self, kind: &str) -> Result<Vec<(Scope, PathBuf)>, StateStoreError> {
        paths::validate_kind(kind)?;
        let root = self.state_root();
        let mut scopes = Vec::new();

        let global_path = paths::mode_state_path(&root, kind)?;
        if global_path.exists() {
            scopes.push((Scope::Global, global_path));
        }

        for session_id in self.list_sessions()? {
            let path = paths::session_mode_state_path(&root, &session_id, kind)?;
            if path.exists() {
                scopes.push((Scope::Session(session_id), path));
            }
        }
        Ok(scopes)
    }

    /// Read `kind` across every scope that has it and return the parsed
    /// values alongside their scope, skipping unreadable/malformed files
    /// rather than failing the whole union (readers tolerate partial
    /// writes per §4.1).
    pub fn read_all_scopes<T: DeserializeOwned>(
        &self,
        kind: &str,
    ) -> Result<Vec<(Scope, T)>, StateStoreError> {
        let mut out = Vec::new();
        for (scope, path) in self.list_scopes(kind)? {
            if let Some(value) = read_json_opt(&path)? {
                out.push((scope, value));
            }
        }
        Ok(out)
    }

    /// All known session ids: the basenames of `sessions/*` directories.
    pub fn list_sessions(&self) -> Result<Vec<String>, StateStoreError> {
        let dir = paths::sessions_dir(&self.state_root());
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| io_err(&dir, e))? {
            let entry = entry.map_err(|e| io_err(&dir, e))?;
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                if let Some(name) = entry.file_name().to_str() {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// All known team names: the basenames of `team/*` directories.
    pub fn list_teams(&self) -> Result<Vec<String>, StateStoreError> {
        let dir = paths::teams_dir(&self.state_root());
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| io_err(&dir, e))? {
            let entry = entry.map_err(|e| io_err(&dir, e))?;
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// The current session pointer (`<root>/session.json`), if a session
    /// is active. Mutating operations fall back to [`Scope::Global`] when
    /// this returns `None`.
    pub fn current_session_scope(&self) -> Result<Scope, StateStoreError> {
        let path = paths::session_pointer_path(&self.state_root());
        #[derive(serde::Deserialize)]
        struct Pointer {
            session_id: String,
        }
        match read_json_opt::<Pointer>(&path)? {
            Some(p) => Ok(Scope::Session(p.session_id)),
            None => Ok(Scope::Global),
        }
    }

    /// Read an arbitrary JSON file by absolute path, tolerating a missing
    /// file as `Ok(None)`. Used by components whose entities don't fit the
    /// `<kind>-state.json` shape (tasks, mailboxes, worker identities).
    pub fn read_path<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, StateStoreError> {
        read_json_opt(path)
    }

    /// Write an arbitrary JSON file by absolute path, atomically.
    pub fn write_path<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StateStoreError> {
        write_json_atomic(path, value)
    }

    /// Append one JSON record as a line to a `.jsonl` file (team event
    /// log, session history). Best-effort durability: creates parent dirs,
    /// opens in append mode, writes the line, and fsyncs the file.
    pub fn append_jsonl<T: Serialize>(&self, path: &Path, record: &T) -> Result<(), StateStoreError> {
        use std::io::Write;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| io_err(path, e))?;
        let mut line = serde_json::to_vec(record).map_err(|source| StateStoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        line.push(b'\n');
        file.write_all(&line).map_err(|e| io_err(path, e))?;
        file.sync_all().map_err(|e| io_err(path, e))?;
        Ok(())
    }

    /// Read every record from a `.jsonl` file, skipping blank lines.
    /// Returns an empty vec if the file does not exist.
    pub fn read_jsonl<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>, StateStoreError> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(path, e)),
        };
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|source| StateStoreError::Malformed {
                    path: path.to_path_buf(),
                    source,
                })
            })
            .collect()
    }

    /// Read a plain-text file (the worker inbox markdown), tolerating a
    /// missing file as `Ok(None)`.
    pub fn read_text(&self, path: &Path) -> Result<Option<String>, StateStoreError> {
        match fs::read_to_string(path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(path, e)),
        }
    }

    /// Write a plain-text file atomically (write-temp-then-rename).
    pub fn write_text(&self, path: &Path, content: &str) -> Result<(), StateStoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let tmp_path = tmp_path_for(path);
        fs::write(&tmp_path, content).map_err(|e| io_err(&tmp_path, e))?;
        fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;
        Ok(())
    }

    /// Resolve a raw working-directory string into an absolute path,
    /// applying the `OMX_MCP_WORKDIR_ROOTS` allowlist when set (§4.1).
    pub fn resolve_working_dir(&self, raw: &str) -> Result<PathBuf, StateStoreError> {
        resolve_working_dir_impl(raw, std::env::var("OMX_MCP_WORKDIR_ROOTS").ok().as_deref())
    }
}

/// Pure function version of `resolve_working_dir`, for deterministic
/// testing without mutating the process environment.
pub fn resolve_working_dir_impl(
    raw: &str,
    allowed_roots: Option<&str>,
) -> Result<PathBuf, StateStoreError> {
    let trimmed = raw.trim();
    if trimmed.contains('\0') {
        return Err(StateStoreError::InvalidInput(
            "working dir must not contain NUL bytes".into(),
        ));
    }
    if trimmed.is_empty() {
        return Err(StateStoreError::InvalidInput(
            "working dir must not be empty".into(),
        ));
    }

    let resolved = if cfg!(not(windows)) {
        if let Some(mapped) = map_windows_drive_path(trimmed) {
            mapped
        } else {
            PathBuf::from(trimmed)
        }
    } else {
        PathBuf::from(trimmed)
    };

    if let Some(roots) = allowed_roots {
        let allowed: Vec<&str> = roots.split(':').filter(|s| !s.is_empty()).collect();
        if !allowed.is_empty() {
            let matches = allowed
                .iter()
                .any(|root| resolved.starts_with(Path::new(root)));
            if !matches {
                return Err(StateStoreError::OutsideAllowedRoots(
                    resolved.display().to_string(),
                ));
            }
        }
    }

    Ok(resolved)
}

/// Map a `X:\…` Windows path to `/mnt/<x>/…` when that mount exists on the
/// host, mirroring WSL path conventions. Returns `None` if the input isn't
/// drive-letter shaped or the mount doesn't exist.
fn map_windows_drive_path(input: &str) -> Option<PathBuf> {
    let bytes = input.as_bytes();
    if bytes.len() < 3 || !bytes[0].is_ascii_alphabetic() || bytes[1] != b':' {
        return None;
    }
    if bytes[2] != b'\\' && bytes[2] != b'/' {
        return None;
    }
    let drive = (bytes[0] as char).to_ascii_lowercase();
    let rest = input[2..].replace('\\', "/");
    let mount = PathBuf::from(format!("/mnt/{drive}"));
    if !mount.exists() {
        return None;
    }
    Some(PathBuf::from(format!("/mnt/{drive}{rest}")))
}

fn io_err(path: &Path, source: io::Error) -> StateStoreError {
    StateStoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read and parse a JSON file, tolerating a missing file as `Ok(None)`.
pub(crate) fn read_json_opt<T: DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, StateStoreError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path, e)),
    };
    if bytes.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StateStoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })
}

/// Write `value` as JSON to `path` atomically: serialize to `<path>.tmp`
/// in the same directory, `sync_all`, then `fs::rename` over the target.
pub(crate) fn write_json_atomic<T: Serialize>(
    path: &Path,
    value: &T,
) -> Result<(), StateStoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp_path = tmp_path_for(path);
    {
        let file = File::create(&tmp_path).map_err(|e| io_err(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|source| {
            StateStoreError::Malformed {
                path: tmp_path.clone(),
                source,
            }
        })?;
        let file = writer
            .into_inner()
            .map_err(|e| io_err(&tmp_path, e.into_error()))?;
        file.sync_all().map_err(|e| io_err(&tmp_path, e))?;
    }
    fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "state_store_tests.rs"]
mod tests;

//! Test helpers for black-box `omx` CLI specifications.
//!
//! Provides a small fluent DSL over `assert_cmd` so specs read as
//! "given this project state, running this command produces this output."

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use assert_cmd::cargo::cargo_bin;

/// Path to the `omx` binary built for this workspace.
fn omx_binary() -> PathBuf {
    cargo_bin("omx")
}

/// Create a CLI builder for `omx` commands.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// Fluent builder for one `omx` invocation.
pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            dir: None,
        }
    }

    /// Add CLI arguments.
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Scope the invocation to a project root via the global `--dir` flag.
    pub fn in_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    fn command(self) -> Command {
        let mut cmd = Command::new(omx_binary());
        if let Some(dir) = &self.dir {
            cmd.arg("--dir").arg(dir);
        }
        cmd.args(&self.args);
        cmd
    }

    /// Run and expect success (exit code 0).
    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("omx should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code).
    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("omx should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions.
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(!stdout.contains(unexpected), "stdout should not contain '{unexpected}'\nstdout: {stdout}");
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{expected}'\nstderr: {stderr}");
        self
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.output.status.code()
    }
}

// =============================================================================
// Project
// =============================================================================

/// Temporary project directory: the root `omx --dir` is pointed at.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    /// Create an empty project.
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `.omx/state` root for this project.
    pub fn state_root(&self) -> PathBuf {
        self.dir.path().join(".omx").join("state")
    }

    /// Run `omx` scoped to this project.
    pub fn omx(&self) -> CliBuilder {
        cli().in_dir(self.path())
    }

    /// Read a file under the project root as a string, if present.
    pub fn read(&self, rel: impl AsRef<Path>) -> Option<String> {
        std::fs::read_to_string(self.dir.path().join(rel)).ok()
    }

    /// Read and parse a JSON file under the project root, if present.
    pub fn read_json(&self, rel: impl AsRef<Path>) -> Option<serde_json::Value> {
        self.read(rel).and_then(|s| serde_json::from_str(&s).ok())
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git worktree provisioning for isolated worker/mode workspaces (§4.7).
//! Every git invocation is argv-array form with an explicit timeout; none
//! of it goes through a shell.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use omx_adapters::subprocess::{run_with_timeout, GIT_WORKTREE_TIMEOUT};

use crate::error::EngineError;

/// Result of parsing `--worktree[=name]` / `-w[=name]` out of a launch
/// argv. The parsed name is removed from `remaining_args` so it never
/// reaches the host CLI as prompt input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeModeArgs {
    pub enabled: bool,
    pub detached: bool,
    pub name: Option<String>,
}

/// Parse worktree flags out of `args`, returning the parsed mode and the
/// remaining argv with those flags (and any consumed name) stripped.
pub fn parse_worktree_mode(args: &[String]) -> (WorktreeModeArgs, Vec<String>) {
    let mut mode = WorktreeModeArgs::default();
    let mut remaining = Vec::with_capacity(args.len());
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if let Some(name) = arg.strip_prefix("--worktree=").or_else(|| arg.strip_prefix("-w=")) {
            mode.enabled = true;
            mode.detached = false;
            mode.name = Some(name.to_string());
            i += 1;
            continue;
        }
        if arg == "--worktree" || arg == "-w" {
            mode.enabled = true;
            if let Some(next) = args.get(i + 1) {
                if !next.starts_with('-') {
                    mode.detached = false;
                    mode.name = Some(next.clone());
                    i += 2;
                    continue;
                }
            }
            mode.detached = true;
            mode.name = None;
            i += 1;
            continue;
        }
        remaining.push(arg.clone());
        i += 1;
    }
    (mode, remaining)
}

/// Launch-scoped vs. team-scoped branch naming (§4.7).
#[derive(Debug, Clone)]
pub enum WorktreeScope {
    Launch,
    Team { worker: String },
}

/// A fully-resolved, not-yet-created worktree plan.
#[derive(Debug, Clone)]
pub struct WorktreePlan {
    pub repo_root: PathBuf,
    pub base_ref: String,
    pub branch: String,
    pub worktree_path: PathBuf,
}

async fn git(cwd: &Path, args: &[&str], description: &str) -> Result<std::process::Output, EngineError> {
    let mut cmd = Command::new("git");
    cmd.current_dir(cwd).args(args);
    run_with_timeout(cmd, GIT_WORKTREE_TIMEOUT, description)
        .await
        .map_err(EngineError::TmuxUnavailable)
}

fn stdout_trimmed(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn sanitize_slug(branch: &str) -> String {
    branch
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

/// Compute a worktree plan for the given mode/scope, or `None` if worktree
/// mode wasn't requested. `fallback_name` supplies the branch stem when the
/// bareword form (`--worktree` with no name) was used.
pub async fn plan(
    mode: &WorktreeModeArgs,
    scope: WorktreeScope,
    fallback_name: &str,
    cwd: &Path,
) -> Result<Option<WorktreePlan>, EngineError> {
    if !mode.enabled {
        return Ok(None);
    }

    let toplevel = git(cwd, &["rev-parse", "--show-toplevel"], "git rev-parse --show-toplevel").await?;
    if !toplevel.status.success() {
        return Err(EngineError::TmuxUnavailable(
            "git rev-parse --show-toplevel failed: not inside a git repository".to_string(),
        ));
    }
    let repo_root = PathBuf::from(stdout_trimmed(&toplevel));

    let head = git(&repo_root, &["rev-parse", "HEAD"], "git rev-parse HEAD").await?;
    if !head.status.success() {
        return Err(EngineError::TmuxUnavailable("git rev-parse HEAD failed".to_string()));
    }
    let base_ref = stdout_trimmed(&head);

    let stem = mode.name.clone().unwrap_or_else(|| fallback_name.to_string());
    let branch = match scope {
        WorktreeScope::Launch => stem,
        WorktreeScope::Team { worker } => format!("{stem}/{worker}"),
    };

    let check = git(&repo_root, &["check-ref-format", "--branch", &branch], "git check-ref-format").await?;
    if !check.status.success() {
        return Err(EngineError::InvalidWorktreeBranch(branch));
    }

    let repo_name = repo_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repo".to_string());
    let worktrees_dir = repo_root
        .parent()
        .map(|p| p.join(format!("{repo_name}.omx-worktrees")))
        .unwrap_or_else(|| repo_root.join(".omx-worktrees"));
    let worktree_path = worktrees_dir.join(sanitize_slug(&branch));

    Ok(Some(WorktreePlan {
        repo_root,
        base_ref,
        branch,
        worktree_path,
    }))
}

/// Outcome of successfully provisioning one worktree; kept so `rollback`
/// can reverse exactly what `ensure` did.
#[derive(Debug, Clone)]
pub struct WorktreeResult {
    pub path: PathBuf,
    pub branch: String,
    pub branch_created: bool,
    pub already_existed: bool,
}

#[derive(Debug, Clone)]
struct ExistingWorktree {
    path: PathBuf,
    branch: Option<String>,
    detached: bool,
}

async fn list_worktrees(repo_root: &Path) -> Result<Vec<ExistingWorktree>, EngineError> {
    let output = git(repo_root, &["worktree", "list", "--porcelain"], "git worktree list").await?;
    if !output.status.success() {
        return Err(EngineError::TmuxUnavailable("git worktree list failed".to_string()));
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let mut entries = Vec::new();
    let mut current_path: Option<PathBuf> = None;
    let mut current_branch: Option<String> = None;
    let mut current_detached = false;
    for line in text.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(path) = current_path.take() {
                entries.push(ExistingWorktree {
                    path,
                    branch: current_branch.take(),
                    detached: current_detached,
                });
            }
            current_path = Some(PathBuf::from(path));
            current_detached = false;
        } else if let Some(branch_ref) = line.strip_prefix("branch ") {
            current_branch = branch_ref.strip_prefix("refs/heads/").map(|s| s.to_string());
        } else if line == "detached" {
            current_detached = true;
        }
    }
    if let Some(path) = current_path.take() {
        entries.push(ExistingWorktree {
            path,
            branch: current_branch.take(),
            detached: current_detached,
        });
    }
    Ok(entries)
}

async fn branch_exists(repo_root: &Path, branch: &str) -> Result<bool, EngineError> {
    let output = git(
        repo_root,
        &["rev-parse", "--verify", &format!("refs/heads/{branch}")],
        "git rev-parse --verify",
    )
    .await?;
    Ok(output.status.success())
}

/// Create the worktree for `plan`, or detect and report a conflict.
pub async fn ensure(plan: &WorktreePlan) -> Result<WorktreeResult, EngineError> {
    let existing = list_worktrees(&plan.repo_root).await?;

    if let Some(found) = existing.iter().find(|w| w.path == plan.worktree_path) {
        let branch_matches = found.branch.as_deref() == Some(plan.branch.as_str());
        if branch_matches {
            return Ok(WorktreeResult {
                path: plan.worktree_path.clone(),
                branch: plan.branch.clone(),
                branch_created: false,
                already_existed: true,
            });
        }
        return Err(EngineError::WorktreeTargetMismatch(format!(
            "{} is registered to branch {:?}, expected {}",
            plan.worktree_path.display(),
            found.branch,
            plan.branch
        )));
    }

    if plan.worktree_path.exists() {
        return Err(EngineError::WorktreePathConflict(format!(
            "{} exists but is not a registered worktree",
            plan.worktree_path.display()
        )));
    }

    if let Some(holder) = existing.iter().find(|w| w.branch.as_deref() == Some(plan.branch.as_str())) {
        return Err(EngineError::BranchInUse(format!(
            "branch {} is already checked out at {}",
            plan.branch,
            holder.path.display()
        )));
    }

    let pre_existed = branch_exists(&plan.repo_root, &plan.branch).await?;
    let path_str = plan.worktree_path.to_string_lossy().into_owned();
    let output = if pre_existed {
        git(
            &plan.repo_root,
            &["worktree", "add", "--detach", &path_str, &plan.base_ref],
            "git worktree add --detach",
        )
        .await?
    } else {
        git(
            &plan.repo_root,
            &["worktree", "add", "-b", &plan.branch, &path_str, &plan.base_ref],
            "git worktree add -b",
        )
        .await?
    };
    if !output.status.success() {
        return Err(EngineError::TmuxUnavailable(format!(
            "git worktree add failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    Ok(WorktreeResult {
        path: plan.worktree_path.clone(),
        branch: plan.branch.clone(),
        branch_created: !pre_existed,
        already_existed: false,
    })
}

/// Reverse every successfully-created worktree in `results`, in reverse
/// order. Never partially aborts: every item is attempted even if an
/// earlier one failed, and all failures are aggregated into one error.
pub async fn rollback(repo_root: &Path, results: &[WorktreeResult]) -> Result<(), EngineError> {
    let mut errors = Vec::new();
    for result in results.iter().rev() {
        if result.already_existed {
            continue;
        }
        let path_str = result.path.to_string_lossy().into_owned();
        match git(repo_root, &["worktree", "remove", "--force", &path_str], "git worktree remove").await {
            Ok(output) if output.status.success() => {}
            Ok(output) => errors.push(format!(
                "worktree remove {}: {}",
                result.path.display(),
                String::from_utf8_lossy(&output.stderr)
            )),
            Err(e) => errors.push(format!("worktree remove {}: {e}", result.path.display())),
        }

        if result.branch_created {
            match list_worktrees(repo_root).await {
                Ok(remaining) if remaining.iter().any(|w| w.branch.as_deref() == Some(result.branch.as_str())) => {}
                Ok(_) => match git(repo_root, &["branch", "-D", &result.branch], "git branch -D").await {
                    Ok(output) if output.status.success() => {}
                    Ok(output) => errors.push(format!(
                        "branch delete {}: {}",
                        result.branch,
                        String::from_utf8_lossy(&output.stderr)
                    )),
                    Err(e) => errors.push(format!("branch delete {}: {e}", result.branch)),
                },
                Err(e) => errors.push(format!("worktree list while deleting {}: {e}", result.branch)),
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(EngineError::WorktreeRollbackFailed(errors.join("; ")))
    }
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;

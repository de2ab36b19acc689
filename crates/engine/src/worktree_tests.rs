use super::*;

use tempfile::TempDir;

fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let run = |args: &[&str]| {
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(dir.path())
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            .output()
            .unwrap();
        assert!(output.status.success(), "git {args:?} failed: {}", String::from_utf8_lossy(&output.stderr));
    };
    run(&["init"]);
    run(&["config", "user.email", "test@example.com"]);
    run(&["config", "user.name", "test"]);
    run(&["commit", "--allow-empty", "-m", "init"]);
    dir
}

#[test]
fn parse_worktree_mode_bareword_form_is_detached() {
    let args = vec!["--worktree".to_string(), "do the thing".to_string()];
    let (mode, remaining) = parse_worktree_mode(&args);
    assert!(mode.enabled);
    assert!(!mode.detached);
    assert_eq!(mode.name.as_deref(), Some("do the thing"));
    assert!(remaining.is_empty());
}

#[test]
fn parse_worktree_mode_flag_only_is_detached_with_no_name() {
    let args = vec!["-w".to_string(), "--other".to_string()];
    let (mode, remaining) = parse_worktree_mode(&args);
    assert!(mode.enabled);
    assert!(mode.detached);
    assert!(mode.name.is_none());
    assert_eq!(remaining, vec!["--other".to_string()]);
}

#[test]
fn parse_worktree_mode_equals_form_sets_name() {
    let args = vec!["--worktree=feature-x".to_string()];
    let (mode, remaining) = parse_worktree_mode(&args);
    assert!(mode.enabled);
    assert!(!mode.detached);
    assert_eq!(mode.name.as_deref(), Some("feature-x"));
    assert!(remaining.is_empty());
}

#[test]
fn parse_worktree_mode_absent_leaves_args_untouched() {
    let args = vec!["run".to_string(), "the".to_string(), "task".to_string()];
    let (mode, remaining) = parse_worktree_mode(&args);
    assert!(!mode.enabled);
    assert_eq!(remaining, args);
}

#[tokio::test]
async fn plan_resolves_repo_root_and_sanitized_branch() {
    let repo = init_repo();
    let mode = WorktreeModeArgs {
        enabled: true,
        detached: false,
        name: Some("feature/x y".to_string()),
    };
    let plan = plan(&mode, WorktreeScope::Launch, "fallback", repo.path()).await.unwrap().unwrap();
    assert_eq!(plan.repo_root, repo.path().canonicalize().unwrap());
    assert_eq!(plan.branch, "feature/x y");
    assert!(plan.worktree_path.to_string_lossy().contains("feature-x-y"));
}

#[tokio::test]
async fn plan_team_scope_namespaces_branch_under_worker() {
    let repo = init_repo();
    let mode = WorktreeModeArgs {
        enabled: true,
        detached: true,
        name: None,
    };
    let plan = plan(&mode, WorktreeScope::Team { worker: "worker-1".to_string() }, "team-alpha", repo.path())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(plan.branch, "team-alpha/worker-1");
}

#[tokio::test]
async fn plan_returns_none_when_worktree_mode_disabled() {
    let repo = init_repo();
    let mode = WorktreeModeArgs::default();
    let plan = plan(&mode, WorktreeScope::Launch, "fallback", repo.path()).await.unwrap();
    assert!(plan.is_none());
}

#[tokio::test]
async fn plan_rejects_invalid_branch_names() {
    let repo = init_repo();
    let mode = WorktreeModeArgs {
        enabled: true,
        detached: false,
        name: Some("..".to_string()),
    };
    let err = plan(&mode, WorktreeScope::Launch, "fallback", repo.path()).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidWorktreeBranch(_)));
}

#[tokio::test]
async fn ensure_creates_a_new_worktree_and_branch() {
    let repo = init_repo();
    let mode = WorktreeModeArgs {
        enabled: true,
        detached: false,
        name: Some("feature-a".to_string()),
    };
    let plan = plan(&mode, WorktreeScope::Launch, "fallback", repo.path()).await.unwrap().unwrap();
    let result = ensure(&plan).await.unwrap();
    assert!(!result.already_existed);
    assert!(result.branch_created);
    assert!(plan.worktree_path.join(".git").is_file());
}

#[tokio::test]
async fn ensure_is_idempotent_for_the_same_plan() {
    let repo = init_repo();
    let mode = WorktreeModeArgs {
        enabled: true,
        detached: false,
        name: Some("feature-b".to_string()),
    };
    let plan = plan(&mode, WorktreeScope::Launch, "fallback", repo.path()).await.unwrap().unwrap();
    ensure(&plan).await.unwrap();
    let second = ensure(&plan).await.unwrap();
    assert!(second.already_existed);
    assert!(!second.branch_created);
}

#[tokio::test]
async fn ensure_rejects_branch_already_checked_out_elsewhere() {
    let repo = init_repo();
    let mode = WorktreeModeArgs {
        enabled: true,
        detached: false,
        name: Some("feature-c".to_string()),
    };
    let mut plan_a = plan(&mode, WorktreeScope::Launch, "fallback", repo.path()).await.unwrap().unwrap();
    ensure(&plan_a).await.unwrap();

    plan_a.worktree_path = repo.path().join(".omx-worktrees-other").join("feature-c-dup");
    let err = ensure(&plan_a).await.unwrap_err();
    assert!(matches!(err, EngineError::BranchInUse(_)));
}

#[tokio::test]
async fn rollback_removes_created_worktree_and_branch() {
    let repo = init_repo();
    let mode = WorktreeModeArgs {
        enabled: true,
        detached: false,
        name: Some("feature-d".to_string()),
    };
    let plan = plan(&mode, WorktreeScope::Launch, "fallback", repo.path()).await.unwrap().unwrap();
    let result = ensure(&plan).await.unwrap();

    rollback(&plan.repo_root, &[result]).await.unwrap();

    assert!(!plan.worktree_path.exists());
    let branches = std::process::Command::new("git")
        .args(["branch", "--list", "feature-d"])
        .current_dir(&plan.repo_root)
        .output()
        .unwrap();
    assert!(String::from_utf8_lossy(&branches.stdout).trim().is_empty());
}

#[tokio::test]
async fn rollback_leaves_a_pre_existing_worktree_alone() {
    let repo = init_repo();
    let mode = WorktreeModeArgs {
        enabled: true,
        detached: false,
        name: Some("feature-e".to_string()),
    };
    let plan = plan(&mode, WorktreeScope::Launch, "fallback", repo.path()).await.unwrap().unwrap();
    let result = ensure(&plan).await.unwrap();
    let already_existed = WorktreeResult { already_existed: true, ..result };

    rollback(&plan.repo_root, &[already_existed]).await.unwrap();

    assert!(plan.worktree_path.exists());
}

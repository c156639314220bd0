//! Integration tests for the CLI interface

mod common;

use assert_cmd::Command;
use common::{TestWorkspace, TestWorkspaceBuilder, BUILD_WORKFLOW};
use predicates::prelude::*;

fn workspace() -> TestWorkspace {
    let workspace = TestWorkspaceBuilder::new()
        .unwrap()
        .with_workflow("build.yml", BUILD_WORKFLOW)
        .build()
        .unwrap();
    std::fs::write(workspace.state_dir.join("config.toml"), "").unwrap();
    workspace
}

/// The binary pointed at the workspace with isolated state
fn actbench(workspace: &TestWorkspace) -> Command {
    let mut cmd = Command::cargo_bin("actbench").unwrap();
    cmd.env("ACTBENCH_STATE_DIR", &workspace.state_dir)
        .env_remove("ACTBENCH_ACT_COMMAND")
        .env_remove("ACTBENCH_RUN_TIMEOUT")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(workspace.state_dir.join("config.toml"))
        .arg("--folder")
        .arg(workspace.folder());
    cmd
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = Command::cargo_bin("actbench").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("workflows"))
        .stdout(predicate::str::contains("history"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("actbench").unwrap();
    cmd.arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let workspace = workspace();
    let mut cmd = Command::cargo_bin("actbench").unwrap();
    cmd.env("ACTBENCH_STATE_DIR", &workspace.state_dir)
        .arg("--config")
        .arg(workspace.state_dir.join("missing.toml"))
        .arg("workflows")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_invalid_env_override_is_reported() {
    let workspace = workspace();
    actbench(&workspace)
        .env("ACTBENCH_RUN_TIMEOUT", "soon")
        .args(["history", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Ignoring invalid ACTBENCH_RUN_TIMEOUT"));
}

#[test]
fn test_workflows_lists_jobs_and_triggers() {
    let workspace = workspace();
    actbench(&workspace)
        .arg("workflows")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build (.github/workflows/build.yml)"))
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("- test"));
}

#[test]
fn test_settings_list_shows_extracted_secret() {
    let workspace = workspace();
    actbench(&workspace)
        .args(["settings", "list", "secrets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[ ] API_KEY ="));
}

#[test]
fn test_selected_secret_is_redacted_in_dry_run() {
    let workspace = workspace();
    actbench(&workspace)
        .args(["settings", "set", "secrets", "API_KEY", "--value", "p@ss\"word", "--select"])
        .assert()
        .success();

    actbench(&workspace)
        .args(["settings", "list", "secrets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] API_KEY"))
        .stdout(predicate::str::contains("p@ss").not());

    actbench(&workspace)
        .args(["run", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"act --secret "API_KEY=***""#))
        .stdout(predicate::str::contains("p@ss").not());
}

#[test]
fn test_dry_run_for_a_job_with_option() {
    let workspace = workspace();
    actbench(&workspace)
        .args(["options", "set", "reuse", "--select"])
        .assert()
        .success();

    actbench(&workspace)
        .args(["run", "--dry-run", "-w", "build.yml", "-j", "test"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "act --workflows .github/workflows/build.yml --job test --reuse",
        ));
}

#[test]
fn test_run_rejects_unknown_job() {
    let workspace = workspace();
    actbench(&workspace)
        .args(["run", "--dry-run", "-w", "build.yml", "-j", "deploy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("deploy"));
}

#[test]
fn test_job_requires_workflow() {
    let workspace = workspace();
    actbench(&workspace)
        .args(["run", "-j", "test"])
        .assert()
        .failure();
}

#[test]
fn test_empty_history() {
    let workspace = workspace();
    actbench(&workspace)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No runs recorded"));
}

#[cfg(unix)]
#[test]
fn test_run_is_recorded_in_history() {
    let workspace = workspace();
    actbench(&workspace)
        .env("ACTBENCH_ACT_COMMAND", "sh -c 'echo hello from act'")
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("hello from act"))
        .stdout(predicate::str::contains("Run #0 succeeded"));

    actbench(&workspace)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#0"))
        .stdout(predicate::str::contains("success"));

    actbench(&workspace)
        .args(["history", "logs", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello from act"));
}

#[cfg(unix)]
#[test]
fn test_failed_run_exits_with_error() {
    let workspace = workspace();
    actbench(&workspace)
        .env("ACTBENCH_ACT_COMMAND", "sh -c 'exit 3'")
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Run #0 failed"));
}

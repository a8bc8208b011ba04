//! Integration tests for the taskchain binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]
#![cfg(unix)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup_plan(plan: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("plan.yml"), plan).unwrap();
    temp
}

const SIMPLE_PLAN: &str = r#"
tasks:
  greet:
    title: "greet-{fn_task_key}"
    command: echo "hello $TASKCHAIN_PARAM_NAME"
  count:
    command: echo "step $TASKCHAIN_STEP of $TASKCHAIN_RUN_ID"
groups:
  both: [greet, count]
runs:
  - run_id: first
    tasks:
      - task: greet
        params: {name: world}
      - task: count
  - group: both
    params:
      - {name: group}
"#;

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("taskchain"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("run chains of tasks"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("taskchain"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_requires_subcommand() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("taskchain"));
    cmd.assert().failure();
    Ok(())
}

#[test]
fn run_prints_results() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_plan(SIMPLE_PLAN);
    let mut cmd = Command::new(cargo_bin("taskchain"));
    cmd.current_dir(temp.path());
    cmd.args(["run", "plan.yml"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("greet-0.first"))
        .stdout(predicate::str::contains("hello world"))
        .stdout(predicate::str::contains("step 1 of first"))
        .stdout(predicate::str::contains("hello group"))
        .stdout(predicate::str::contains("step 1 of both"));
    Ok(())
}

#[test]
fn run_json_is_parseable() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_plan(SIMPLE_PLAN);
    let mut cmd = Command::new(cargo_bin("taskchain"));
    cmd.current_dir(temp.path());
    cmd.args(["run", "plan.yml", "--json", "--quiet"]);

    let output = cmd.output()?;
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(parsed[0]["run_id"], "first");
    assert_eq!(parsed[0]["tasks"][0]["title"], "greet-0.first");
    assert_eq!(parsed[0]["tasks"][0]["state"], "executed");
    assert_eq!(parsed[1]["run_id"], "both");
    assert_eq!(parsed[1]["tasks"][1]["result"]["stdout"], "step 1 of both\n");
    Ok(())
}

#[test]
fn run_with_directory_flag() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_plan(SIMPLE_PLAN);
    let mut cmd = Command::new(cargo_bin("taskchain"));
    cmd.arg("-C").arg(temp.path()).args(["run", "plan.yml", "--parallel"]);
    cmd.assert().success();
    Ok(())
}

#[test]
fn run_run_id_override() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_plan(
        "tasks:\n  a:\n    command: echo $TASKCHAIN_RUN_ID\nruns:\n  - tasks: [{task: a}]\n",
    );
    let mut cmd = Command::new(cargo_bin("taskchain"));
    cmd.current_dir(temp.path());
    cmd.args(["run", "plan.yml", "--run-id", "nightly"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0.nightly"));
    Ok(())
}

#[test]
fn run_failing_task_exits_nonzero() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_plan(
        "tasks:\n  ok:\n    command: echo fine\n  bad:\n    command: exit 5\nruns:\n  - tasks: [{task: ok}, {task: bad}]\n",
    );
    let mut cmd = Command::new(cargo_bin("taskchain"));
    cmd.current_dir(temp.path());
    cmd.args(["run", "plan.yml"]);
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("fine"))
        .stderr(predicate::str::contains("exit code 5"));
    Ok(())
}

#[test]
fn run_missing_plan_exits_2() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = Command::new(cargo_bin("taskchain"));
    cmd.current_dir(temp.path());
    cmd.args(["run", "missing.yml"]);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Plan not found"));
    Ok(())
}

#[test]
fn validate_accepts_good_plan() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_plan(SIMPLE_PLAN);
    let mut cmd = Command::new(cargo_bin("taskchain"));
    cmd.current_dir(temp.path());
    cmd.args(["validate", "plan.yml"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Plan is valid"));
    Ok(())
}

#[test]
fn validate_rejects_reserved_param() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_plan(
        "tasks:\n  a:\n    command: 'true'\nruns:\n  - tasks:\n      - task: a\n        params: {_META_: 1}\n",
    );
    let mut cmd = Command::new(cargo_bin("taskchain"));
    cmd.current_dir(temp.path());
    cmd.args(["validate", "plan.yml"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("reserved-param"));
    Ok(())
}

#[test]
fn list_shows_plan() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_plan(SIMPLE_PLAN);
    let mut cmd = Command::new(cargo_bin("taskchain"));
    cmd.current_dir(temp.path());
    cmd.args(["list", "plan.yml"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Tasks:"))
        .stdout(predicate::str::contains("both: greet -> count"))
        .stdout(predicate::str::contains("run #1 (first)"));
    Ok(())
}

#[test]
fn quiet_hides_status() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_plan(SIMPLE_PLAN);
    let mut cmd = Command::new(cargo_bin("taskchain"));
    cmd.current_dir(temp.path());
    cmd.args(["--quiet", "run", "plan.yml"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("hello world").not());
    Ok(())
}

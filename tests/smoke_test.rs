//! Smoke tests for the kb CLI.
//!
//! These tests verify basic CLI functionality:
//! - `kb --version` outputs version info
//! - `kb --help` outputs help text
//! - bad arguments fail with a usage error

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a Command for the kb binary.
fn kb() -> Command {
    Command::new(env!("CARGO_BIN_EXE_kb"))
}

#[test]
fn test_version_flag() {
    kb().arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kb"))
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_help_flag() {
    kb().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("board"))
        .stdout(predicate::str::contains("--offline"));
}

#[test]
fn test_no_args_shows_usage() {
    kb().assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_unknown_command() {
    kb().arg("frobnicate").assert().failure();
}

#[test]
fn test_move_rejects_unknown_status() {
    kb().args(["--offline", "move", "1", "3", "blocked"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid status"));
}

#[test]
fn test_task_help() {
    kb().args(["task", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("delete"));
}

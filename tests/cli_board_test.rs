//! Integration tests for board commands via CLI.
//!
//! These run against the in-memory demo store (`--offline`), which every
//! invocation seeds afresh:
//! - `kb board` groups cards by column
//! - `kb move/edit/assign` push changes through the sync engine
//! - `kb task create/delete` report toasts on stderr
//! - failures exit non-zero

mod common;

use common::{TestEnv, parse_json};
use predicates::prelude::*;

// === Board ===

#[test]
fn test_board_json() {
    let env = TestEnv::new();
    let output = env.kb_offline().args(["board", "1"]).output().unwrap();
    assert!(output.status.success());

    let json = parse_json(&output.stdout);
    assert_eq!(json["project"], "Website relaunch");
    let todo: Vec<u64> = json["columns"][0]["cards"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_u64().unwrap())
        .collect();
    assert_eq!(todo, vec![4, 3]);
    assert_eq!(json["columns"][1]["status"], "in_progress");
    assert_eq!(json["columns"][2]["cards"][0]["assignee"], "Ada Lovelace");
    assert_eq!(json["hidden"], 0);
}

#[test]
fn test_board_human_readable() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["board", "1", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Website relaunch (#1)"))
        .stdout(predicate::str::contains("To do (2)"))
        .stdout(predicate::str::contains("#4  Set up redirects  [User #9]"))
        .stdout(predicate::str::contains("#3  Migrate blog posts  [Unassigned]"));
}

#[test]
fn test_board_of_empty_project() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["board", "2", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mobile app (#2)"))
        .stdout(predicate::str::contains("Done (0)"));
}

#[test]
fn test_board_unreachable_api() {
    let env = TestEnv::new();
    env.kb()
        .args(["--api-base", "http://127.0.0.1:9/api", "board", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load tasks."));
}

// === Move ===

#[test]
fn test_move_task() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["move", "1", "3", "done"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"moved\":true"))
        .stdout(predicate::str::contains("\"from\":\"todo\""))
        .stdout(predicate::str::contains("\"to\":\"done\""));
}

#[test]
fn test_move_accepts_dashed_status() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["move", "1", "3", "in-progress", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved task #3: todo -> in_progress"));
}

#[test]
fn test_move_to_same_column() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["move", "1", "2", "in_progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"moved\":false"));
}

#[test]
fn test_move_unknown_task() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["move", "1", "99", "done"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task #99 not found"));
}

// === Edit / assign ===

#[test]
fn test_edit_title_and_description() {
    let env = TestEnv::new();
    let output = env
        .kb_offline()
        .args([
            "edit",
            "1",
            "3",
            "--title",
            "Migrate all posts",
            "--description",
            "Including drafts",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = parse_json(&output.stdout);
    assert_eq!(json["fields"], serde_json::json!(["title", "description"]));
    assert_eq!(json["task"]["title"], "Migrate all posts");
    assert_eq!(json["task"]["description"], "Including drafts");
}

#[test]
fn test_edit_without_fields() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["edit", "1", "3", "-H"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Invalid input: Nothing to edit"));
}

#[test]
fn test_assign_and_unassign() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["assign", "1", "3", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"assignee\":\"Grace Hopper\""))
        .stdout(predicate::str::contains("\"assigneeId\":2"));

    env.kb_offline()
        .args(["assign", "1", "1", "none", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Assignee: Unassigned"));
}

#[test]
fn test_assign_unknown_user() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["assign", "1", "3", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("User #42 not found"));
}

// === Task create / delete ===

#[test]
fn test_task_create() {
    let env = TestEnv::new();
    let output = env
        .kb_offline()
        .args([
            "task",
            "create",
            "1",
            "--title",
            "Write release notes",
            "--status",
            "in_progress",
            "--assignee",
            "3",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = parse_json(&output.stdout);
    assert_eq!(json["task"]["id"], 100);
    assert_eq!(json["task"]["projectId"], 1);
    assert_eq!(json["task"]["status"], "in_progress");
    assert_eq!(json["assignee"], "Alan Turing");

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains(r#""message":"Task created.""#));
}

#[test]
fn test_task_create_blank_title() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["task", "create", "1", "--title", "   ", "-H"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("✗ Task title is required."))
        .stderr(predicate::str::contains("Error:").not());
}

#[test]
fn test_task_delete() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["task", "delete", "1", "4", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted task #4 from project #1"))
        .stderr(predicate::str::contains("✓ Task deleted."));
}

#[test]
fn test_task_delete_unknown() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["task", "delete", "1", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""));
}

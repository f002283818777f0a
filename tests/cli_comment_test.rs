//! Integration tests for comment commands via CLI.

mod common;

use common::{TestEnv, parse_json};
use predicates::prelude::*;

#[test]
fn test_comment_list() {
    let env = TestEnv::new();
    let output = env
        .kb_offline()
        .args(["comment", "list", "1", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = parse_json(&output.stdout);
    assert_eq!(json["task_title"], "Pick a CMS");
    assert_eq!(json["comments"][0]["author"], "Grace Hopper");
    assert_eq!(json["comments"][0]["text"], "Shortlisted two candidates");
}

#[test]
fn test_comment_list_human_empty() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["comment", "list", "1", "3", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No comments on #3 Migrate blog posts"));
}

#[test]
fn test_comment_add_uses_session_user() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["--user", "Margaret", "comment", "add", "1", "3", "Starting today"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"author\":\"Margaret\""))
        .stderr(predicate::str::contains("Comment added."));
}

#[test]
fn test_comment_add_falls_back_to_first_user() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["comment", "add", "1", "3", "Looks good", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("as Ada Lovelace"));
}

#[test]
fn test_comment_add_user_from_config() {
    let env = TestEnv::new();
    env.write_config("user-name = \"Barbara\"\n");
    env.kb_offline()
        .args(["comment", "add", "1", "3", "Noted"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"author\":\"Barbara\""));
}

#[test]
fn test_comment_add_blank_text() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["comment", "add", "1", "3", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Comment text is required."));
}

#[test]
fn test_comment_delete() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["comment", "delete", "1", "2", "1", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted comment 1 from task #2"))
        .stderr(predicate::str::contains("✓ Comment deleted."));
}

#[test]
fn test_comment_delete_unknown() {
    let env = TestEnv::new();
    env.kb_offline()
        .args(["comment", "delete", "1", "3", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Comment 1 not found on task #3"));
}

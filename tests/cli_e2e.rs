//! End-to-end CLI tests for the instaloader binary.
//!
//! None of these reach the retrieval service: every case ends before the
//! first request.

use assert_cmd::Command;
use predicates::prelude::*;

fn instaloader() -> Command {
    let mut cmd = Command::cargo_bin("instaloader").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    instaloader()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: instaloader"))
        .stdout(predicate::str::contains("--post-filter"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    instaloader()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("instaloader"));
}

/// Without targets and without login nothing happens.
#[test]
fn test_binary_without_targets_is_silent_success() {
    instaloader()
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    instaloader()
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_removed_target_prints_bare_message() {
    instaloader()
        .args(["alice", ":feed-all"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with(
            ":feed-all and :feed-liked were removed. Use :feed as target",
        ));
}

#[test]
fn test_invalid_filter_is_fatal() {
    instaloader()
        .args(["--post-filter", "likes >", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Fatal error: Invalid filter"));
}

#[test]
fn test_unknown_filter_attribute_is_fatal() {
    instaloader()
        .args(["--storyitem-filter", "likes > 3", ":stories"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Invalid filter: likes not a StoryItem attribute.",
        ));
}

#[test]
fn test_stories_only_without_login_fails() {
    instaloader()
        .args(["--stories-only", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "--login=USERNAME required to download stories.",
        ))
        .stderr(predicate::str::contains("Fatal error").not());
}

#[test]
fn test_password_without_login_fails() {
    instaloader()
        .args(["-p", "secret", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--password requires --login=USERNAME."));
}

#[test]
fn test_quiet_login_without_credentials_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let session_file = dir.path().join("session-alice");
    instaloader()
        .arg("-q")
        .args(["-l", "alice", "-f"])
        .arg(&session_file)
        .arg("alice")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Fatal error: Quiet mode requires given password or valid session file.",
        ));
    assert!(!session_file.exists());
}

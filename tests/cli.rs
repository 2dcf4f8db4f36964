//! Binary-level tests for adishe
//!
//! These never reach a router: they cover argument handling and the checks
//! that run before any network access.

use std::path::PathBuf;
use std::process::Command;

/// Get the path to the compiled binary
fn get_binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps directory
    path.push("adishe");
    path
}

/// Run adishe and return output
fn run_adishe(args: &[&str]) -> std::process::Output {
    Command::new(get_binary_path())
        .args(args)
        .env_remove("ADISHE_PASSWORD")
        .output()
        .expect("Failed to execute adishe")
}

#[test]
fn test_version_flag() {
    let output = run_adishe(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("adishe"));
}

#[test]
fn test_help_flag() {
    let output = run_adishe(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--target"));
    assert!(stdout.contains("--mode"));
    assert!(stdout.contains("--dry-run"));
    assert!(stdout.contains("ADISHE_PASSWORD"));
}

#[test]
fn test_unknown_flag_fails() {
    let output = run_adishe(&["--no-such-flag"]);
    assert!(!output.status.success());
}

#[test]
fn test_plain_http_source_is_rejected() {
    let output = run_adishe(&["-q", "--source", "http://example.com/hosts"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("HTTPS"));
}

#[test]
fn test_invalid_tag_is_rejected() {
    let output = run_adishe(&["--tag", "bad tag"]);
    assert!(!output.status.success());
}

#[test]
fn test_unreachable_router_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let lock = dir.path().join("adishe.lock");
    let output = run_adishe(&[
        "-a",
        "127.0.0.1",
        "--api-port",
        "1",
        "--timeout",
        "2",
        "--lock-file",
        lock.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot connect to router"));
}

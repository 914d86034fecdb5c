//! Smoke tests for the certgem CLI
//!
//! Nothing here needs a browser or a running portal.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A certgem command running in an empty directory with no suite env vars
fn certgem(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("certgem").expect("certgem binary should exist");
    cmd.current_dir(dir.path());
    for var in [
        "CI",
        "CERTGEM_BASE_URL",
        "CERTGEM_AUTH_STATE",
        "CERTGEM_HEADLESS",
        "CERTGEM_RETRIES",
        "CERTGEM_EMAIL",
        "CERTGEM_PASSWORD",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    certgem(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("setup"))
        .stdout(predicate::str::contains("smoke"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    certgem(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    certgem(&dir).assert().failure();
}

#[test]
fn test_unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    certgem(&dir)
        .arg("deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ============================================================================
// Config Command Tests
// ============================================================================

#[test]
fn test_config_prints_defaults_as_yaml() {
    let dir = TempDir::new().unwrap();
    certgem(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("base_url"))
        .stdout(predicate::str::contains("http://localhost:4200"))
        .stdout(predicate::str::contains("auth.json"));
}

#[test]
fn test_config_json_format() {
    let dir = TempDir::new().unwrap();
    let output = certgem(&dir)
        .args(["config", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["base_url"], "http://localhost:4200");
    assert_eq!(json["retries"], 0);
}

#[test]
fn test_config_reads_yaml_in_working_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("certgem.yaml"),
        "base_url: https://qa.certgem.dev\nretries: 1\n",
    )
    .unwrap();
    certgem(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://qa.certgem.dev"))
        .stdout(predicate::str::contains("retries: 1"));
}

#[test]
fn test_env_overrides_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ci.yaml");
    fs::write(&path, "base_url: https://qa.certgem.dev\n").unwrap();
    certgem(&dir)
        .args(["config", "--config"])
        .arg(&path)
        .env("CERTGEM_BASE_URL", "https://staging.certgem.dev")
        .env("CI", "true")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://staging.certgem.dev"))
        .stdout(predicate::str::contains("retries: 2"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    certgem(&dir)
        .args(["config", "--config", "nope.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn test_unknown_config_key_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("certgem.yaml"), "base_uri: http://x\n").unwrap();
    certgem(&dir)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_uri"));
}

// ============================================================================
// Browser Command Tests (fail before any browser is launched)
// ============================================================================

#[test]
fn test_setup_without_credentials_fails() {
    let dir = TempDir::new().unwrap();
    certgem(&dir)
        .arg("setup")
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
    assert!(!dir.path().join("auth.json").exists());
}

#[test]
fn test_smoke_rejects_bad_base_url() {
    let dir = TempDir::new().unwrap();
    certgem(&dir)
        .args(["smoke", "--base-url", "localhost:4200"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_url"));
}

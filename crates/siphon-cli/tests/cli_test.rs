//! Tests for the siphon binary that need no network access

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn siphon(dir: &TempDir) -> Command {
    let config = dir.path().join("pool.toml");
    if !config.exists() {
        fs::write(
            &config,
            "region = \"us-east-2\"\naccess_key_id = \"AKID\"\nsecret_access_key = \"SECRET\"\n",
        )
        .unwrap();
    }

    let mut cmd = Command::cargo_bin("siphon").unwrap();
    cmd.arg("--config").arg(config);
    cmd
}

#[test]
fn test_help_lists_pool_verbs() {
    let mut cmd = Command::cargo_bin("siphon").unwrap();
    cmd.arg("--help");

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for verb in ["ls", "get", "put", "mkdir", "rm", "cp", "mv", "siphon", "info"] {
        assert!(stdout.contains(verb), "help is missing {verb}");
    }
}

#[test]
fn test_info_reports_backend() {
    let dir = TempDir::new().unwrap();
    siphon(&dir)
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::diff("s3\n"));
}

#[test]
fn test_put_without_container_fails() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("hello.txt");
    fs::write(&file, "hello").unwrap();

    siphon(&dir)
        .arg("put")
        .arg("/")
        .arg(&file)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid path"));
}

#[test]
fn test_rm_root_fails() {
    let dir = TempDir::new().unwrap();
    siphon(&dir).args(["rm", "/"]).assert().code(3);
}

#[test]
fn test_cp_from_nothing_fails() {
    let dir = TempDir::new().unwrap();
    siphon(&dir).args(["cp", "", "/bucket/a"]).assert().code(3);
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("siphon").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load"));
}

#[test]
fn test_put_missing_local_file_fails() {
    let dir = TempDir::new().unwrap();
    siphon(&dir)
        .args(["put", "/bucket/a.txt"])
        .arg(dir.path().join("nope.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open"));
}

#[test]
fn test_config_save_writes_resolved_settings() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("saved").join("pool.toml");

    siphon(&dir)
        .args(["--region", "eu-west-1", "config", "--save"])
        .arg(&target)
        .assert()
        .success();

    let saved = fs::read_to_string(&target).unwrap();
    assert!(saved.contains("eu-west-1"));
    assert!(saved.contains("AKID"));
}

#[test]
fn test_config_show_redacts_secret() {
    let dir = TempDir::new().unwrap();
    siphon(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("<redacted>"))
        .stdout(predicate::str::contains("SECRET").not());
}

#[test]
fn test_empty_region_flag_keeps_default() {
    let dir = TempDir::new().unwrap();
    siphon(&dir)
        .args(["--region", "", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("us-east-2"));
}

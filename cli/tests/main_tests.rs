//! # DeComp CLI Main Integration Tests
//!
//! File: cli/tests/main_tests.rs
//!
//! Verifies top-level behaviour of the `decomp` binary: `--help`,
//! `--version`, and the error path for bad arguments and configuration.
//!
mod common;

use common::{decomp_cmd, write_config};
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_main_help_flag() {
    decomp_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("contents"));
}

#[test]
fn test_main_version_flag() {
    decomp_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_subcommand_fails() {
    decomp_cmd().arg("explode").assert().failure();
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempdir().unwrap();
    decomp_cmd()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .args(["detect", "a.tar.gz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "[decompress]\nseparator = \"-\"\n");
    decomp_cmd()
        .arg("--config")
        .arg(config)
        .args(["detect", "a.tar.gz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("separator"));
}

#[test]
fn test_config_from_environment_variable() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "[compress]\nunknown_key = 1\n");
    decomp_cmd()
        .env("DECOMP_CONFIG", config)
        .args(["modes", "--kind", "compress"])
        .assert()
        .failure();
}

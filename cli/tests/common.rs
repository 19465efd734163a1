//! # DeComp CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! Shared helpers for the integration tests in `cli/tests/`. Each test file
//! declares `mod common;` and builds its commands through [`decomp_cmd`] or
//! [`decomp_isolated`].
//!

// Not every test file uses every helper.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

/// Returns a `Command` for the compiled `decomp` binary.
pub fn decomp_cmd() -> Command {
    Command::cargo_bin("decomp").expect("Failed to find decomp binary for testing")
}

/// Writes `contents` as a config file inside `dir` and returns its path.
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("decomp.toml");
    fs::write(&path, contents).expect("Failed to write test config");
    path
}

/// A `decomp` command pinned to an empty config file in `dir`, so user and
/// project configuration (and `RUST_LOG`) on the test host cannot leak in.
pub fn decomp_isolated(dir: &Path) -> Command {
    let config = write_config(dir, "");
    let mut cmd = decomp_cmd();
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

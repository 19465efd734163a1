//! # DeComp Process Execution Utilities (`common::process`)
//!
//! File: lib/src/common/process.rs
//!
//! ## Overview
//!
//! Two ways of running the external tools:
//!
//! - [`ShellRunner`] hands a rendered command line to a shell (`/bin/bash -c`
//!   by default). Compression, extraction and rsync go through here; the
//!   result is the exit status, output goes straight to the terminal.
//! - [`run_capture`] runs a program directly and captures its output. The
//!   contents listing uses it.
//!
//! In both cases extra environment variables are layered on top of the
//! inherited environment.
//!
use crate::core::error::{DecompError, Result};
use anyhow::anyhow;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Shell used when none is configured.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Runs command lines through a shell.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    pub shell: PathBuf,
    pub env: HashMap<String, String>,
    /// Pass `-x` to the shell so it echoes each command it runs.
    pub trace: bool,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            env: HashMap::new(),
            trace: false,
        }
    }
}

impl ShellRunner {
    /// Runs `command_line` and reports whether it exited with status 0.
    ///
    /// `id` names the definition being run and only appears in logs.
    /// Returns `Err` only when the shell itself could not be started.
    pub fn run(&self, command_line: &str, id: &str) -> Result<bool> {
        // Keep our own buffered output ahead of the child's.
        let _ = std::io::stdout().flush();

        let mut cmd = Command::new(&self.shell);
        if self.trace {
            cmd.arg("-x");
        }
        cmd.arg("-c").arg(command_line).envs(&self.env);
        debug!("subcmd(); shell = {}, command = {}", self.shell.display(), command_line);

        let status = cmd.status().map_err(|e| {
            anyhow!(DecompError::Spawn {
                program: self.shell.display().to_string(),
                source: e,
            })
        })?;

        if !status.success() {
            debug!("Non-zero return value ({}) from: {}", status, id);
            return Ok(false);
        }
        Ok(true)
    }
}

/// Captured output of a finished program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    /// Standard output followed by standard error, separated by a newline.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Runs `argv[0]` with the remaining arguments, without a shell, and
/// captures its output.
pub fn run_capture(argv: &[String], env: &HashMap<String, String>) -> Result<Captured> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("Cannot run an empty command"))?;
    debug!("Capturing output of: {}", argv.join(" "));

    let output = Command::new(program)
        .args(args)
        .envs(env)
        .output()
        .map_err(|e| {
            anyhow!(DecompError::Spawn {
                program: program.clone(),
                source: e,
            })
        })?;

    Ok(Captured {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

//! # DeComp Common Utilities (`common`)
//!
//! File: lib/src/common/mod.rs
//!
//! ## Overview
//!
//! Host interaction used by the dispatchers:
//!
//! - **`process`**: Runs rendered command lines through a shell, or programs directly with captured output.
//! - **`system`**: Probes `PATH` for the binaries a mode requires.
//!

/// Utilities for executing external processes.
pub mod process;
/// Utilities for checking which tools are installed.
pub mod system;

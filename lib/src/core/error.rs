//! # DeComp Error Types
//!
//! File: lib/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout the DeComp library and
//! the CLI built on top of it.
//!
//! ## Architecture
//!
//! The error system consists of two main components:
//! - `DecompError`: A custom error enum using `thiserror` for specific error types
//! - `Result<T>`: A type alias for `anyhow::Result<T>` for flexible error handling
//!
//! Callers that need to react to a particular failure can downcast:
//!
//! ```rust
//! use decomp::core::error::DecompError;
//!
//! # fn check(result: decomp::core::error::Result<()>) {
//! match result {
//!     Err(e) if matches!(e.downcast_ref::<DecompError>(), Some(DecompError::NoModeDetected { .. })) => {
//!         println!("Unknown archive type, pass --mode explicitly");
//!     }
//!     _ => {}
//! }
//! # }
//! ```
//!
use crate::core::definitions::Kind;
use thiserror::Error;

/// Custom error type for DeComp.
#[derive(Error, Debug)]
pub enum DecompError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("mode '{mode}' is not supported by the loaded {kind} definitions")]
    UnsupportedMode { mode: String, kind: Kind },

    #[error("{kind} error: no mode was passed in or automatically detected for '{source_path}'")]
    NoModeDetected { kind: Kind, source_path: String },

    #[error("operation requires {expected} definitions, but {actual} definitions are loaded")]
    WrongKind { expected: Kind, actual: Kind },

    #[error("Template rendering error: {source}")]
    Template {
        #[from]
        source: tera::Error,
    },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("External command failed ({id}): {command}")]
    CommandFailed { id: String, command: String },
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

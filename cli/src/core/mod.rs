//! # DeComp CLI Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! CLI-only infrastructure. Error types come from the `decomp` library
//! (`decomp::core::error`); this crate adds configuration loading:
//! - `config`: Configuration loading, merging, and validation
//!
//! ```rust
//! use crate::core::config; // For loading configuration
//! use decomp::core::error::{DecompError, Result}; // For error handling
//! ```
//!
pub mod config;

//! # DeComp Core Infrastructure
//!
//! File: lib/src/core/mod.rs
//!
//! ## Overview
//!
//! Foundational pieces shared by every dispatcher:
//! - `definitions`: the mode tables and custom definition loading
//! - `error`: error types and the `Result` alias
//! - `templating`: rendering of command templates
//!
pub mod definitions;
pub mod error;
pub mod templating;

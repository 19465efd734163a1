//! # DeComp Dispatchers
//!
//! File: lib/src/dispatch/mod.rs
//!
//! ## Overview
//!
//! - `compress`: [`CompressMap`](compress::CompressMap) for compression, extraction and rsync
//! - `contents`: [`ContentsMap`](contents::ContentsMap) for archive listings
//! - `resolve`: extension based mode detection shared by both
//!
pub mod compress;
pub mod contents;
pub mod resolve;

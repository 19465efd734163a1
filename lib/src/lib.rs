//! # DeComp
//!
//! File: lib/src/lib.rs
//!
//! ## Overview
//!
//! DeComp compresses, extracts and lists archives, and runs rsync transfers,
//! by invoking the archive tools installed on the host. Nothing is compressed
//! in-process: each *mode* (`gzip`, `pixz`, `squashfs`, `rsync`, ...) is a
//! definition naming a program, an argument template, the filename
//! extensions it recognises and the binaries it needs.
//!
//! ## Architecture
//!
//! 1. **Definitions** (`core::definitions`): built-in tables per kind, or custom TOML files.
//! 2. **Availability** (`common::system`): which required binaries are on `PATH`.
//! 3. **Mode resolution** (`dispatch::resolve`): first mode in the search order whose extension matches and whose binaries exist.
//! 4. **Rendering** (`core::templating`): Tera renders the argument template.
//! 5. **Execution** (`common::process`): the command runs through a shell, success is exit status 0.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use decomp::{CompressMap, CompressOptions, ContentsMap, ContentsOptions, DefinitionSet, Request};
//!
//! # fn main() -> decomp::Result<()> {
//! let compressor = CompressMap::new(DefinitionSet::compression(), CompressOptions::default())?;
//! compressor.compress(
//!     &Request::new("stage3")
//!         .basedir("/var/tmp/build")
//!         .filename("/srv/stage3-amd64")
//!         .mode("xz")
//!         .auto_extension(true),
//! )?;
//!
//! let lister = ContentsMap::new(DefinitionSet::contents(), ContentsOptions::default())?;
//! println!("{}", lister.contents("/srv/stage3-amd64.tar.xz", None, None, false)?);
//! # Ok(())
//! # }
//! ```
//!
pub mod common;
pub mod core;
pub mod dispatch;

pub use crate::core::definitions::{Definition, DefinitionSet, Handler, Kind, TarFlavor};
pub use crate::core::error::{DecompError, Result};
pub use crate::core::templating::Request;
pub use crate::dispatch::compress::{CompressMap, CompressOptions};
pub use crate::dispatch::contents::{ContentsMap, ContentsOptions};

//! # DeComp Contents Command
//!
//! File: cli/src/commands/contents.rs
//!
//! ## Overview
//!
//! Implements `decomp contents`, printing the listing produced by the
//! archive's listing tool (`tar -tv`, `unsquashfs -ll`, `isoinfo -l`, ...).
//! With `-v` the listing is also written to the log.
//!
//! ## Usage
//!
//! ```bash
//! decomp contents stage3-amd64.tar.xz
//! decomp contents install.iso -m isoinfo_f
//! ```
//!
use super::build_contents_map;
use crate::core::config::Config;
use clap::Parser;
use decomp::core::error::Result;
use tracing::info;

/// Arguments for the 'contents' subcommand.
#[derive(Parser, Debug)]
pub struct ContentsArgs {
    /// Archive or image to list.
    source: String,
    /// Listing mode, or `auto` to detect it (default).
    #[arg(short, long)]
    mode: Option<String>,
    /// Destination passed to definitions that need one.
    #[arg(short, long)]
    destination: Option<String>,
}

/// Handler function for the 'contents' subcommand.
pub fn handle_contents(args: ContentsArgs, cfg: &Config, log_listing: bool) -> Result<()> {
    info!("Handling contents command...");
    let map = build_contents_map(cfg)?;
    let listing = map.contents(
        &args.source,
        args.destination.as_deref(),
        args.mode.as_deref(),
        log_listing,
    )?;
    print!("{}", listing);
    Ok(())
}

//! # DeComp Extract Command
//!
//! File: cli/src/commands/extract.rs
//!
//! ## Overview
//!
//! Implements `decomp extract`. Without `--mode` the decompression mode is
//! picked from the archive's extension, honouring the configured search
//! order and skipping modes whose tools are not installed.
//!
//! ## Usage
//!
//! ```bash
//! decomp extract stage3-amd64.tar.xz /mnt/gentoo
//! decomp extract portage.tar.bz2 /var/db/repos -m bzip2 -o --no-same-owner
//! decomp extract livecd.squashfs /tmp/root --dry-run
//! ```
//!
use super::build_compress_map;
use crate::core::config::Config;
use clap::Parser;
use decomp::core::error::Result;
use decomp::{Kind, Request};
use tracing::info;

/// Arguments for the 'extract' subcommand.
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Archive to unpack.
    source: String,
    /// Directory to unpack into.
    destination: String,
    /// Decompression mode, or `auto` to detect it (default).
    #[arg(short, long)]
    mode: Option<String>,
    /// Extra option passed to the tool (repeatable).
    #[arg(short = 'o', long = "option", allow_hyphen_values = true)]
    options: Vec<String>,
    /// Print the command line instead of running it.
    #[arg(long)]
    dry_run: bool,
}

/// Handler function for the 'extract' subcommand.
pub fn handle_extract(args: ExtractArgs, cfg: &Config, trace: bool) -> Result<()> {
    info!("Handling extract command...");
    let map = build_compress_map(cfg, Kind::Decompression, trace)?;

    let mut request = Request::new(args.source)
        .destination(args.destination)
        .other_options(args.options);
    request.mode = args.mode;

    if args.dry_run {
        println!("{}", map.command_line(&request)?);
        return Ok(());
    }
    map.extract(&request)
}

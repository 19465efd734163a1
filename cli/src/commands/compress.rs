//! # DeComp Compress Command
//!
//! File: cli/src/commands/compress.rs
//!
//! ## Overview
//!
//! Implements `decomp compress`, which archives `SOURCE` (relative to
//! `--basedir`) into `FILENAME` using a compression mode.
//!
//! ## Usage
//!
//! ```bash
//! # bzip2 (the default mode) into stage3.tar.bz2
//! decomp compress -C /var/tmp/build stage3 /srv/stage3 --auto-ext
//!
//! # squashfs image with an x86 BCJ filter
//! decomp compress -C /var/tmp/build livecd /srv/livecd.squashfs -m squashfs --arch x86
//!
//! # Print the tar command instead of running it
//! decomp compress rootfs rootfs.tar.xz -m xz --dry-run
//! ```
//!
use super::build_compress_map;
use crate::core::config::Config;
use clap::Parser;
use decomp::core::error::Result;
use decomp::{Kind, Request};
use tracing::info;

/// Arguments for the 'compress' subcommand.
#[derive(Parser, Debug)]
pub struct CompressArgs {
    /// Directory or file to archive, relative to --basedir.
    source: String,
    /// Archive to create.
    filename: String,
    /// Directory to change into before archiving.
    #[arg(short = 'C', long)]
    basedir: Option<String>,
    /// Compression mode (defaults to the configured default, `bzip2`).
    #[arg(short, long)]
    mode: Option<String>,
    /// Append the mode's extension to FILENAME.
    #[arg(long)]
    auto_ext: bool,
    /// Target architecture for modes with architecture filters (squashfs).
    #[arg(long)]
    arch: Option<String>,
    /// Extra option passed to the tool (repeatable).
    #[arg(short = 'o', long = "option", allow_hyphen_values = true)]
    options: Vec<String>,
    /// Print the command line instead of running it.
    #[arg(long)]
    dry_run: bool,
}

/// Handler function for the 'compress' subcommand.
pub fn handle_compress(args: CompressArgs, cfg: &Config, trace: bool) -> Result<()> {
    info!("Handling compress command...");
    let map = build_compress_map(cfg, Kind::Compression, trace)?;

    let mut request = Request::new(args.source)
        .filename(args.filename)
        .auto_extension(args.auto_ext)
        .other_options(args.options);
    request.basedir = args.basedir;
    request.mode = args.mode;
    request.arch = args.arch;

    if args.dry_run {
        println!("{}", map.command_line(&request)?);
        return Ok(());
    }
    map.compress(&request)
}

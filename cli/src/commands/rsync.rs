//! # DeComp Rsync Command
//!
//! File: cli/src/commands/rsync.rs
//!
//! Implements `decomp rsync SOURCE DESTINATION`, running the `rsync` mode of
//! the decompression definitions (`rsync -a --delete`).
//!
use super::build_compress_map;
use crate::core::config::Config;
use clap::Parser;
use decomp::core::error::Result;
use decomp::{Kind, Request};
use tracing::info;

/// Arguments for the 'rsync' subcommand.
#[derive(Parser, Debug)]
pub struct RsyncArgs {
    /// Directory to copy from.
    source: String,
    /// Directory to copy to.
    destination: String,
    /// Print the command line instead of running it.
    #[arg(long)]
    dry_run: bool,
}

/// Handler function for the 'rsync' subcommand.
pub fn handle_rsync(args: RsyncArgs, cfg: &Config, trace: bool) -> Result<()> {
    info!("Handling rsync command...");
    let map = build_compress_map(cfg, Kind::Decompression, trace)?;
    if args.dry_run {
        let request = Request::new(args.source.as_str())
            .destination(args.destination.as_str())
            .mode("rsync");
        println!("{}", map.command_line(&request)?);
        return Ok(());
    }
    map.rsync(&args.source, &args.destination)
}

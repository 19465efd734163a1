//! # DeComp Detect Command
//!
//! File: cli/src/commands/detect.rs
//!
//! Implements `decomp detect FILE`, printing the mode that `extract` (or,
//! with `--kind contents`, `contents`) would pick for FILE on this host.
//! Fails when no installed mode recognises the file.
//!
use super::modes::KindArg;
use super::{build_compress_map, build_contents_map};
use crate::core::config::Config;
use anyhow::anyhow;
use clap::Parser;
use decomp::core::error::{DecompError, Result};
use decomp::Kind;
use tracing::info;

/// Arguments for the 'detect' subcommand.
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// File to inspect.
    file: String,
    /// Which definitions to match against.
    #[arg(long, value_enum, default_value = "decompress")]
    kind: KindArg,
}

/// Handler function for the 'detect' subcommand.
pub fn handle_detect(args: DetectArgs, cfg: &Config) -> Result<()> {
    info!("Handling detect command...");
    let kind: Kind = args.kind.into();
    let mode = match kind {
        Kind::Contents => build_contents_map(cfg)?.determine_mode(&args.file),
        _ => build_compress_map(cfg, kind, false)?.determine_mode(&args.file),
    };
    match mode {
        Some(mode) => {
            println!("{}", mode);
            Ok(())
        }
        None => Err(anyhow!(DecompError::NoModeDetected {
            kind,
            source_path: args.file,
        })),
    }
}

//! # DeComp Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file serves as the main entry point for the `decomp` CLI application.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Loading the configuration once and routing to command handlers
//!
//! ## Architecture
//!
//! Each top-level command (`compress`, `extract`, etc.) is a variant in the
//! `Commands` enum and maps to a handler in its module under `commands/`.
//! Handlers receive the loaded [`core::config::Config`]; all errors are
//! propagated to this level for consistent reporting.
//!
//! ## Examples
//!
//! ```bash
//! # Unpack, detecting the mode from the extension
//! decomp extract stage3-amd64.tar.xz /mnt/gentoo
//!
//! # Show what would run, with shell tracing enabled for real runs at -vvv
//! decomp -vv compress rootfs stage3 -m xz --auto-ext --dry-run
//! ```
//!
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // Subcommand arguments and handlers
mod core; // Configuration loading

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "decomp",
    about = "Archive compression, extraction and listing through the system's tools",
    long_about = "Picks an installed archive tool (tar with gzip/bzip2/xz/zstd helpers, \
                  squashfs tools, isoinfo, rsync) from a table of definitions\n\
                  and runs it through a subshell.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace and shell tracing).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Use this configuration file instead of the user and project ones.
    #[arg(long, global = true, env = "DECOMP_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// `-vvv` also makes the shell echo each command it runs.
    fn shell_trace(&self) -> bool {
        self.verbose >= 3
    }

    /// Any `-v` logs archive listings as well as printing them.
    fn log_listing(&self) -> bool {
        self.verbose > 0
    }
}

/// Enum defining all available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    #[command(alias = "c")]
    Compress(commands::compress::CompressArgs),
    #[command(alias = "x")]
    Extract(commands::extract::ExtractArgs),
    #[command(alias = "t")]
    Contents(commands::contents::ContentsArgs),
    Rsync(commands::rsync::RsyncArgs),
    Modes(commands::modes::ModesArgs),
    Detect(commands::detect::DetectArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let trace = cli.shell_trace();
    let log_listing = cli.log_listing();
    let command_result = core::config::load_config(cli.config.as_deref()).and_then(|cfg| {
        match cli.command {
            Commands::Compress(args) => commands::compress::handle_compress(args, &cfg, trace),
            Commands::Extract(args) => commands::extract::handle_extract(args, &cfg, trace),
            Commands::Contents(args) => {
                commands::contents::handle_contents(args, &cfg, log_listing)
            }
            Commands::Rsync(args) => commands::rsync::handle_rsync(args, &cfg, trace),
            Commands::Modes(args) => commands::modes::handle_modes(args, &cfg),
            Commands::Detect(args) => commands::detect::handle_detect(args, &cfg),
        }
    });

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "decomp", "detect", "a.tar.gz", "-vv", "--config", "/tmp/decomp.toml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/decomp.toml")));
        assert!(matches!(cli.command, Commands::Detect(_)));
        assert_eq!(cli.log_level(), "debug");
        assert!(cli.log_listing());
        assert!(!cli.shell_trace());
    }

    #[test]
    fn test_triple_verbose_enables_shell_trace() {
        let cli = Cli::try_parse_from(["decomp", "-vvv", "extract", "a.tar", "out"]).unwrap();
        assert_eq!(cli.log_level(), "trace");
        assert!(cli.shell_trace());

        let cli = Cli::try_parse_from(["decomp", "extract", "a.tar", "out"]).unwrap();
        assert_eq!(cli.log_level(), "warn");
        assert!(!cli.shell_trace());
        assert!(!cli.log_listing());
    }
}

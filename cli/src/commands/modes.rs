//! # DeComp Modes Command
//!
//! File: cli/src/commands/modes.rs
//!
//! ## Overview
//!
//! Implements `decomp modes`, a table of every loaded mode: its identifier,
//! the program it runs, the binaries it needs, whether all of them are
//! installed, and the extensions it recognises. Modes in the search order
//! are marked with `*`.
//!
//! ```bash
//! decomp modes
//! decomp modes --kind contents
//! ```
//!
use super::load_definitions;
use crate::core::config::Config;
use clap::{Parser, ValueEnum};
use decomp::common::system;
use decomp::core::error::Result;
use decomp::{DefinitionSet, Kind};
use std::collections::BTreeSet;
use tracing::info;

/// Definition family selector shared by `modes` and `detect`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Compress,
    Decompress,
    Contents,
}

impl From<KindArg> for Kind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Compress => Kind::Compression,
            KindArg::Decompress => Kind::Decompression,
            KindArg::Contents => Kind::Contents,
        }
    }
}

/// Arguments for the 'modes' subcommand.
#[derive(Parser, Debug)]
pub struct ModesArgs {
    /// Only show one family of definitions.
    #[arg(long, value_enum)]
    kind: Option<KindArg>,
}

/// Handler function for the 'modes' subcommand.
pub fn handle_modes(args: ModesArgs, cfg: &Config) -> Result<()> {
    info!("Handling modes command...");
    let kinds = match args.kind {
        Some(kind) => vec![kind.into()],
        None => vec![Kind::Compression, Kind::Decompression, Kind::Contents],
    };
    for (i, kind) in kinds.into_iter().enumerate() {
        if i > 0 {
            println!();
        }
        let set = load_definitions(cfg, kind)?;
        let search_order = match kind {
            Kind::Compression => cfg.compress.search_order.clone(),
            Kind::Decompression => cfg.decompress.search_order.clone(),
            Kind::Contents => cfg.contents.search_order.clone(),
        }
        .unwrap_or_else(|| set.search_order.clone());
        let all_modes: Vec<String> = set.definitions.keys().cloned().collect();
        let available = system::check_available(set.binaries(&all_modes));
        print!("{}", format_table(&set, &search_order, &available));
    }
    Ok(())
}

fn format_table(set: &DefinitionSet, search_order: &[String], available: &BTreeSet<String>) -> String {
    let mut out = format!("{} ({} modes)\n", set.description, set.definitions.len());
    out.push_str(&format!(
        "  {:<12} {:<14} {:<12} {:<22} {:<10} {}\n",
        "MODE", "ID", "COMMAND", "BINARIES", "STATUS", "EXTENSIONS"
    ));
    for (name, def) in &set.definitions {
        let marker = if search_order.contains(name) { "*" } else { " " };
        let binaries = def.binaries.iter().cloned().collect::<Vec<_>>().join(",");
        let status = if def.enabled(available) {
            "available"
        } else {
            "missing"
        };
        out.push_str(&format!(
            "{} {:<12} {:<14} {:<12} {:<22} {:<10} {}\n",
            marker,
            name,
            def.id,
            def.cmd,
            binaries,
            status,
            def.extensions.join(" ")
        ));
    }
    out
}

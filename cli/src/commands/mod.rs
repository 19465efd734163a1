//! # DeComp Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! Aggregates the subcommands of the `decomp` CLI and the helpers they share
//! for turning the loaded [`Config`] into library dispatchers.
//!
//! ## Commands
//!
//! - `compress`: create an archive with a compression mode
//! - `extract`: unpack an archive, detecting the mode from its extension by default
//! - `contents`: print an archive listing
//! - `rsync`: synchronise two directories
//! - `modes`: show every mode with its tools and their availability
//! - `detect`: print the mode that would be picked for a file
//!
//! Each command defines its own arguments structure and handler function.
//!
use crate::core::config::Config;
use anyhow::{anyhow, Context};
use decomp::core::error::{DecompError, Result};
use decomp::{CompressMap, CompressOptions, ContentsMap, ContentsOptions, DefinitionSet, Kind};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Creates archives.
pub mod compress;
/// Lists archive contents.
pub mod contents;
/// Reports the mode auto-detection would choose.
pub mod detect;
/// Unpacks archives.
pub mod extract;
/// Lists the loaded modes.
pub mod modes;
/// Directory synchronisation through rsync.
pub mod rsync;

/// Loads the definition set for `kind`: the configured custom file if any,
/// otherwise the built-in table.
pub(crate) fn load_definitions(cfg: &Config, kind: Kind) -> Result<DefinitionSet> {
    let section = match kind {
        Kind::Compression => &cfg.compress,
        Kind::Decompression => &cfg.decompress,
        Kind::Contents => &cfg.contents,
    };
    let Some(path) = &section.definitions else {
        return Ok(DefinitionSet::builtin(kind));
    };
    debug!("Using custom {} definitions from {}", kind, path);
    let set = DefinitionSet::from_path(Path::new(path))?;
    if set.kind != kind {
        return Err(anyhow!(DecompError::Config(format!(
            "definitions file '{}' contains {} definitions, expected {}",
            path, set.kind, kind
        ))));
    }
    Ok(set)
}

/// Builds a compression or decompression map from the configuration.
pub(crate) fn build_compress_map(cfg: &Config, kind: Kind, trace: bool) -> Result<CompressMap> {
    let set = load_definitions(cfg, kind)?;
    let section = match kind {
        Kind::Compression => &cfg.compress,
        _ => &cfg.decompress,
    };
    let mut options = CompressOptions {
        env: cfg.env.clone(),
        default_mode: section.default_mode.clone(),
        search_order: section.search_order.clone(),
        tar_flavor: cfg.tar_flavor.unwrap_or_default(),
        trace,
        ..Default::default()
    };
    if let Some(separator) = &section.separator {
        options.separator = separator.clone();
    }
    if let Some(shell) = &cfg.shell {
        options.shell = PathBuf::from(shell);
    }
    CompressMap::new(set, options).with_context(|| format!("Failed to set up {} map", kind))
}

/// Builds the contents map from the configuration.
pub(crate) fn build_contents_map(cfg: &Config) -> Result<ContentsMap> {
    let set = load_definitions(cfg, Kind::Contents)?;
    let options = ContentsOptions {
        env: cfg.env.clone(),
        default_mode: cfg.contents.default_mode.clone(),
        search_order: cfg.contents.search_order.clone(),
        tar_flavor: cfg.tar_flavor.unwrap_or_default(),
    };
    ContentsMap::new(set, options).context("Failed to set up contents map")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ModeConfig;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_definitions_builtin_by_default() {
        let set = load_definitions(&Config::default(), Kind::Contents).unwrap();
        assert_eq!(set.kind, Kind::Contents);
        assert!(set.get("isoinfo_l").is_some());
    }

    #[test]
    fn test_load_definitions_kind_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("defs.toml");
        fs::write(
            &path,
            r#"
            kind = "contents"
            [definitions.tar]
            cmd = "tar"
            args = ["-tvf", "{{ source }}"]
            id = "TAR"
            extensions = ["tar"]
            binaries = ["tar"]
            "#,
        )
        .unwrap();
        let cfg = Config {
            decompress: ModeConfig {
                definitions: Some(path.to_string_lossy().to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = load_definitions(&cfg, Kind::Decompression).unwrap_err();
        assert!(err.to_string().contains("expected Decompression"));
    }

    #[test]
    fn test_build_compress_map_applies_config() {
        let cfg = Config {
            compress: ModeConfig {
                default_mode: Some("xz".to_string()),
                separator: Some("_".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let map = build_compress_map(&cfg, Kind::Compression, false).unwrap();
        assert_eq!(map.default_mode(), "xz");
        let line = map
            .command_line(
                &decomp::Request::new("dir")
                    .filename("out")
                    .auto_extension(true),
            )
            .unwrap();
        assert_eq!(line, "tar -cpJf out_tar.xz -C . dir");
    }
}

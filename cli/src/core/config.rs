//! # DeComp CLI Configuration
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! Loads, merges and validates the CLI configuration. The configuration only
//! tunes how the library is driven: which tar flavor the templates target,
//! default modes and search orders, custom definition files, the shell and
//! extra environment variables for the spawned tools.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. An explicit `--config <file>` (or `DECOMP_CONFIG`), which replaces the two below
//! 2. Project-specific `.decomp.toml` in current directory or ancestors
//! 3. User-specific `config.toml` in the platform config directory
//! 4. Library defaults
//!
//! ## Examples
//!
//! ```toml
//! shell = "/bin/bash"
//! tar_flavor = "linux"
//!
//! [env]
//! XZ_OPT = "-T0"
//!
//! [compress]
//! default_mode = "xz"
//! separator = "."
//!
//! [decompress]
//! search_order = ["pixz", "xz", "gzip", "tar"]
//!
//! [contents]
//! definitions = "~/.config/decomp/contents.toml"
//! ```
//!
use anyhow::{anyhow, Context};
use decomp::core::error::{DecompError, Result};
use decomp::TarFlavor;
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::HashMap;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Shell used to run compression, extraction and rsync command lines.
    pub shell: Option<String>,
    /// Option spelling of the host's tar.
    pub tar_flavor: Option<TarFlavor>,
    /// Extra environment variables for the spawned tools.
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub compress: ModeConfig,
    #[serde(default)]
    pub decompress: ModeConfig,
    #[serde(default)]
    pub contents: ModeConfig,
}

/// Per-operation settings.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModeConfig {
    pub default_mode: Option<String>,
    pub search_order: Option<Vec<String>>,
    /// Path to a custom definition file (can use ~). Will be expanded.
    pub definitions: Option<String>,
    /// Auto-extension separator. Only meaningful under `[compress]`.
    pub separator: Option<String>,
}

impl ModeConfig {
    fn or(self, fallback: ModeConfig) -> ModeConfig {
        ModeConfig {
            default_mode: self.default_mode.or(fallback.default_mode),
            search_order: self.search_order.or(fallback.search_order),
            definitions: self.definitions.or(fallback.definitions),
            separator: self.separator.or(fallback.separator),
        }
    }
}

const PROJECT_CONFIG_FILENAME: &str = ".decomp.toml";

/// Loads the effective configuration.
///
/// With `explicit` set only that file is read and it must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            load_config_from_path(path)?
        }
        None => {
            let user_config = load_user_config()?;
            let project_config = load_project_config()?;
            merge_configs(user_config.unwrap_or_default(), project_config)
        }
    };
    expand_config_paths(&mut config).context("Failed to expand paths in configuration")?;
    validate_config(&config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", config);
    Ok(config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("org", "DeComp", "decomp") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<Config>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    if let Some(project_config_path) = find_project_config_path(&current_dir) {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file (.decomp.toml) found in current directory or ancestors.");
        Ok(None)
    }
}

/// Walks up from `start` looking for `.decomp.toml`, stopping at the first
/// directory that contains `.git`.
fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Project values win over user values; environment maps are combined.
fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project_cfg = match project {
        Some(p) => p,
        None => return user,
    };
    let mut env = user.env;
    env.extend(project_cfg.env);
    Config {
        shell: project_cfg.shell.or(user.shell),
        tar_flavor: project_cfg.tar_flavor.or(user.tar_flavor),
        env,
        compress: project_cfg.compress.or(user.compress),
        decompress: project_cfg.decompress.or(user.decompress),
        contents: project_cfg.contents.or(user.contents),
    }
}

fn expand_config_paths(config: &mut Config) -> Result<()> {
    for section in [
        &mut config.compress,
        &mut config.decompress,
        &mut config.contents,
    ] {
        if let Some(path) = section.definitions.as_mut() {
            *path = shellexpand::tilde(path.as_str()).into_owned();
            debug!("Expanded definitions path: {}", path);
        }
    }
    Ok(())
}

fn validate_config(config: &Config) -> Result<()> {
    if matches!(config.shell.as_deref(), Some(s) if s.trim().is_empty()) {
        return Err(anyhow!(DecompError::Config(
            "shell must not be empty".to_string()
        )));
    }
    if matches!(config.compress.separator.as_deref(), Some("")) {
        return Err(anyhow!(DecompError::Config(
            "compress.separator must not be empty".to_string()
        )));
    }
    for (name, section) in [
        ("decompress", &config.decompress),
        ("contents", &config.contents),
    ] {
        if section.separator.is_some() {
            return Err(anyhow!(DecompError::Config(format!(
                "'separator' is only valid in [compress], found in [{}]",
                name
            ))));
        }
    }
    for (name, section) in [
        ("compress", &config.compress),
        ("decompress", &config.decompress),
        ("contents", &config.contents),
    ] {
        if let Some(path) = &section.definitions {
            let path = PathBuf::from(path);
            if !path.is_file() {
                return Err(anyhow!(DecompError::Config(format!(
                    "[{}] definitions file '{}' does not exist or is not a file.",
                    name,
                    path.display()
                ))));
            }
        }
    }
    Ok(())
}

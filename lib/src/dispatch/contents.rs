//! # DeComp Contents Listing
//!
//! File: lib/src/dispatch/contents.rs
//!
//! ## Overview
//!
//! [`ContentsMap`] lists what is inside an archive by running the listing
//! tool of the matching mode (`tar -tvf`, `unsquashfs -ll`, `isoinfo -l`, ...)
//! and returning whatever it printed.
//!
//! Unlike compression and extraction the rendered command is not passed to a
//! shell: it is split on whitespace and executed directly, with both output
//! streams captured.
//!
use crate::common::{process, system};
use crate::core::definitions::{DefinitionSet, Kind, TarFlavor};
use crate::core::error::{DecompError, Result};
use crate::core::templating::{render_args, Request};
use crate::dispatch::compress::AUTO_MODE;
use crate::dispatch::resolve;
use anyhow::anyhow;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, error, info};

/// Construction options for [`ContentsMap`].
#[derive(Debug, Clone, Default)]
pub struct ContentsOptions {
    pub env: HashMap<String, String>,
    /// Defaults to `auto`.
    pub default_mode: Option<String>,
    /// Defaults to the definition set's own search order.
    pub search_order: Option<Vec<String>>,
    pub tar_flavor: TarFlavor,
}

/// Archive listing dispatcher.
#[derive(Debug, Clone)]
pub struct ContentsMap {
    set: DefinitionSet,
    mode: String,
    search_order: Vec<String>,
    tar_flavor: TarFlavor,
    env: HashMap<String, String>,
    available: BTreeSet<String>,
}

impl ContentsMap {
    /// Builds the map and probes `PATH` for the binaries of the search order.
    pub fn new(set: DefinitionSet, options: ContentsOptions) -> Result<Self> {
        let order = options
            .search_order
            .clone()
            .unwrap_or_else(|| set.search_order.clone());
        let available = system::check_available(set.binaries(&order));
        Self::with_available(set, options, available)
    }

    /// Builds the map with a known set of available binaries.
    pub fn with_available(
        set: DefinitionSet,
        options: ContentsOptions,
        available: BTreeSet<String>,
    ) -> Result<Self> {
        if set.kind != Kind::Contents {
            return Err(anyhow!(DecompError::WrongKind {
                expected: Kind::Contents,
                actual: set.kind,
            }));
        }
        let search_order = options
            .search_order
            .unwrap_or_else(|| set.search_order.clone());
        set.validate_order(&search_order)?;
        info!("ContentsMap: search_order = {:?}", search_order);

        Ok(Self {
            set,
            mode: options.default_mode.unwrap_or_else(|| AUTO_MODE.to_string()),
            search_order,
            tar_flavor: options.tar_flavor,
            env: options.env,
            available,
        })
    }

    pub fn default_mode(&self) -> &str {
        &self.mode
    }

    pub fn search_order(&self) -> &[String] {
        &self.search_order
    }

    pub fn available_binaries(&self) -> &BTreeSet<String> {
        &self.available
    }

    pub fn available_modes(&self) -> Vec<&str> {
        self.set.definitions.keys().map(String::as_str).collect()
    }

    pub fn is_supported(&self, mode: &str) -> bool {
        self.set.definitions.contains_key(mode)
    }

    pub fn definition_set(&self) -> &DefinitionSet {
        &self.set
    }

    /// Picks the listing mode for `source` from its extension.
    pub fn determine_mode(&self, source: &str) -> Option<String> {
        debug!("ContentsMap: determine_mode(), source = {}", source);
        resolve::determine_mode(
            &self.set.definitions,
            &self.search_order,
            &self.available,
            source,
        )
    }

    /// The argv that listing `source` with `mode` would execute.
    pub fn command(&self, source: &str, destination: Option<&str>, mode: Option<&str>) -> Result<Vec<String>> {
        let mode = mode.unwrap_or(&self.mode);
        let mode = if mode == AUTO_MODE {
            self.determine_mode(source).ok_or_else(|| {
                anyhow!(DecompError::NoModeDetected {
                    kind: Kind::Contents,
                    source_path: source.to_string(),
                })
            })?
        } else {
            mode.to_string()
        };
        let def = self.set.get(&mode).ok_or_else(|| {
            anyhow!(DecompError::UnsupportedMode {
                mode: mode.clone(),
                kind: Kind::Contents,
            })
        })?;

        let mut request = Request::new(source).mode(mode.as_str());
        request.destination = destination.map(str::to_string);
        let rendered = render_args(&def.args, &request, self.tar_flavor)?;

        let mut argv = vec![def.cmd.clone()];
        argv.extend(
            rendered
                .iter()
                .flat_map(|arg| arg.split_whitespace())
                .map(str::to_string),
        );
        Ok(argv)
    }

    /// Lists the contents of `source`.
    ///
    /// `mode` of `None` uses the default mode; `auto` detects it from the
    /// extension. The returned text is the tool's stdout and stderr joined by
    /// a newline. With `verbose` the listing is also logged.
    pub fn contents(
        &self,
        source: &str,
        destination: Option<&str>,
        mode: Option<&str>,
        verbose: bool,
    ) -> Result<String> {
        let argv = self.command(source, destination, mode)?;
        let captured = process::run_capture(&argv, &self.env).map_err(|e| {
            error!("ContentsMap: failed to run '{}': {}", argv.join(" "), e);
            e
        })?;
        if !captured.success {
            debug!("ContentsMap: '{}' exited unsuccessfully", argv.join(" "));
        }
        let result = captured.combined();
        if verbose {
            info!("{}", result);
        }
        Ok(result)
    }
}

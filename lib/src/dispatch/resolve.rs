//! # DeComp Mode Resolution
//!
//! File: lib/src/dispatch/resolve.rs
//!
//! ## Overview
//!
//! Picks a mode from a filename. The search order is walked front to back
//! and the first mode wins whose extensions include a suffix of the filename
//! and whose required binaries are all installed. Matching is a plain
//! `ends_with`, so `tbz2` and `tar.bz2` are recognised alike.
//!
use crate::core::definitions::Definition;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use tracing::{debug, warn};

/// Walks `search_order` and returns the first mode that recognises the
/// extension of `source` and whose binaries are all `available`.
pub fn determine_mode(
    definitions: &BTreeMap<String, Definition>,
    search_order: &[String],
    available: &BTreeSet<String>,
    source: &str,
) -> Option<String> {
    for mode in search_order {
        debug!("determine_mode(), trying mode = {}", mode);
        let Some(def) = definitions.get(mode) else {
            continue;
        };
        let matches = def
            .extensions
            .iter()
            .any(|ext| source.ends_with(ext.as_str()));
        if matches && def.enabled(available) {
            debug!("determine_mode(), selected mode = {}", mode);
            return Some(mode.clone());
        }
    }
    warn!("determine_mode(), failed to find a mode to use for: {}", source);
    None
}

/// The last extension of `source` including its leading dot, e.g. `.xz` for
/// `stage3.tar.xz`.
pub fn get_extension(source: &str) -> Option<String> {
    Path::new(source)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

/// Extensions of the modes in `search_order`, in order and de-duplicated.
/// Unknown modes are skipped.
pub fn search_order_extensions(
    definitions: &BTreeMap<String, Definition>,
    search_order: &[String],
) -> Vec<String> {
    let mut seen = HashSet::new();
    search_order
        .iter()
        .filter_map(|mode| definitions.get(mode))
        .flat_map(|def| def.extensions.iter())
        .filter(|ext| seen.insert(ext.as_str()))
        .cloned()
        .collect()
}

//! # DeComp Definition Tables
//!
//! File: lib/src/core/definitions.rs
//!
//! ## Overview
//!
//! A *definition* describes how one mode (e.g. `gzip`, `squashfs`, `rsync`)
//! is carried out by an external tool: which program to run, the argument
//! template, the identifying string used in logs, the filename extensions the
//! mode recognises and the binaries that must be installed for it to work.
//!
//! Definitions are grouped into a [`DefinitionSet`] of a single [`Kind`].
//! Three sets are built in (compression, decompression, contents listing);
//! custom sets can be loaded from TOML:
//!
//! ```toml
//! kind = "decompression"
//! description = "Site decompression definitions"
//! search_order = ["lz4"]
//!
//! [definitions.lz4]
//! handler = "common"
//! cmd = "tar"
//! args = ["other_options", "-I", "lz4", "-xpf", "{{ source }}", "-C", "{{ destination }}"]
//! id = "LZ4"
//! extensions = ["tar.lz4"]
//! binaries = ["tar", "lz4"]
//! ```
//!
//! ## Templates
//!
//! Argument tokens are rendered with Tera. The names a template may use are
//! `source`, `destination`, `basedir`, `filename`, `arch`, `mode`,
//! `comp_prog`, `decomp_opt` and `list_xattrs_opt`. The bare token
//! [`OTHER_OPTIONS`] marks where caller-supplied options are spliced in.
//!
use crate::core::error::{DecompError, Result};
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Placeholder token replaced by caller-supplied extra options.
pub const OTHER_OPTIONS: &str = "other_options";

/// Separator placed between a filename and an automatically added extension.
pub const EXTENSION_SEPARATOR: &str = ".";

/// Which family of operations a definition set serves.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Compression,
    Decompression,
    Contents,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Compression => write!(f, "Compression"),
            Kind::Decompression => write!(f, "Decompression"),
            Kind::Contents => write!(f, "Contents"),
        }
    }
}

/// How a definition's template is turned into a command.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Handler {
    /// Render the template as-is.
    #[default]
    Common,
    /// Like `Common`, but `-Xbcj {{ arch }}` is dropped when no arch is given.
    Squashfs,
    /// Directory synchronisation through rsync.
    Rsync,
}

/// Tar implementation whose option spelling the templates should use.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TarFlavor {
    /// GNU tar.
    #[default]
    Linux,
    /// bsdtar / libarchive.
    Bsd,
}

impl TarFlavor {
    /// Option that hands compression to an external program.
    pub fn comp_prog(&self) -> &'static str {
        match self {
            TarFlavor::Linux => "-I",
            TarFlavor::Bsd => "--use-compress-program",
        }
    }

    /// Option that hands decompression to an external program.
    pub fn decomp_opt(&self) -> &'static str {
        match self {
            TarFlavor::Linux => "-I",
            TarFlavor::Bsd => "--use-compress-program",
        }
    }

    /// Options that make a listing include extended attributes.
    pub fn list_xattrs_opt(&self) -> &'static str {
        match self {
            TarFlavor::Linux => "--xattrs",
            TarFlavor::Bsd => "",
        }
    }
}

/// How to invoke one mode.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Definition {
    #[serde(default)]
    pub handler: Handler,
    /// Program to execute.
    pub cmd: String,
    /// Argument template tokens.
    pub args: Vec<String>,
    /// Short identifier used in log and error messages.
    pub id: String,
    /// Recognised filename extensions, without a leading separator. The first
    /// one is the extension added by auto-extension on compression.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Binaries that must be available on the host.
    #[serde(default)]
    pub binaries: BTreeSet<String>,
}

impl Definition {
    fn builtin(
        handler: Handler,
        cmd: &str,
        args: &[&str],
        id: &str,
        extensions: &[&str],
        binaries: &[&str],
    ) -> Self {
        Self {
            handler,
            cmd: cmd.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            id: id.to_string(),
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            binaries: binaries.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// True when every required binary is in `available`.
    pub fn enabled(&self, available: &BTreeSet<String>) -> bool {
        self.binaries.is_subset(available)
    }
}

/// A named collection of definitions of one kind plus its default search order.
#[derive(Debug, Clone)]
pub struct DefinitionSet {
    pub kind: Kind,
    pub description: String,
    pub definitions: BTreeMap<String, Definition>,
    pub search_order: Vec<String>,
}

/// On-disk shape of a custom definition file.
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct DefinitionFile {
    kind: Kind,
    description: Option<String>,
    search_order: Option<Vec<String>>,
    definitions: BTreeMap<String, Definition>,
}

const RSYNC_ARGS: &[&str] = &["-a", "--delete", "{{ source }}", "{{ destination }}"];

const DECOMPRESSOR_SEARCH_ORDER: &[&str] = &[
    "lbzip2", "bzip2", "tar", "pixz", "xz", "zstd", "gzip", "squashfs",
];

const COMPRESSOR_SEARCH_ORDER: &[&str] = &[
    "lbzip2", "bzip2", "tar", "pixz", "xz", "zstd", "gzip", "squashfs",
];

const CONTENTS_SEARCH_ORDER: &[&str] = &[
    "pixz", "lbzip2", "isoinfo_l", "squashfs", "gzip", "xz", "zstd", "bzip2", "tar",
];

fn create_args(flags: &[&'static str]) -> Vec<&'static str> {
    let mut args = vec![OTHER_OPTIONS];
    args.extend_from_slice(flags);
    args.extend(["{{ filename }}", "-C", "{{ basedir }}", "{{ source }}"]);
    args
}

fn extract_args(flags: &[&'static str]) -> Vec<&'static str> {
    let mut args = vec![OTHER_OPTIONS];
    args.extend_from_slice(flags);
    args.extend(["{{ source }}", "-C", "{{ destination }}"]);
    args
}

fn list_args(flags: &[&'static str]) -> Vec<&'static str> {
    let mut args = vec!["{{ list_xattrs_opt }}"];
    args.extend_from_slice(flags);
    args.push("{{ source }}");
    args
}

impl DefinitionSet {
    fn from_builtin(
        kind: Kind,
        description: &str,
        entries: Vec<(&str, Definition)>,
        search_order: &[&str],
    ) -> Self {
        Self {
            kind,
            description: description.to_string(),
            definitions: entries
                .into_iter()
                .map(|(name, def)| (name.to_string(), def))
                .collect(),
            search_order: search_order.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Built-in compression definitions.
    pub fn compression() -> Self {
        use Handler::*;
        let entries = vec![
            (
                "rsync",
                Definition::builtin(Rsync, "rsync", RSYNC_ARGS, "RSYNC", &[], &["rsync"]),
            ),
            (
                "lbzip2",
                Definition::builtin(
                    Common,
                    "tar",
                    &create_args(&["{{ comp_prog }}", "lbzip2", "-cpf"]),
                    "LBZIP2",
                    &["tar.bz2"],
                    &["tar", "lbzip2"],
                ),
            ),
            (
                "bzip2",
                Definition::builtin(
                    Common,
                    "tar",
                    &create_args(&["-cpjf"]),
                    "BZIP2",
                    &["tar.bz2"],
                    &["tar", "bzip2"],
                ),
            ),
            (
                "tar",
                Definition::builtin(Common, "tar", &create_args(&["-cpf"]), "TAR", &["tar"], &["tar"]),
            ),
            (
                "xz",
                Definition::builtin(
                    Common,
                    "tar",
                    &create_args(&["-cpJf"]),
                    "XZ",
                    &["tar.xz"],
                    &["tar", "xz"],
                ),
            ),
            (
                "pixz",
                Definition::builtin(
                    Common,
                    "tar",
                    &create_args(&["{{ comp_prog }}", "pixz", "-cpf"]),
                    "PIXZ",
                    &["tar.xz"],
                    &["tar", "pixz"],
                ),
            ),
            (
                "zstd",
                Definition::builtin(
                    Common,
                    "tar",
                    &create_args(&["{{ comp_prog }}", "zstd", "-cpf"]),
                    "ZSTD",
                    &["tar.zst"],
                    &["tar", "zstd"],
                ),
            ),
            (
                "gzip",
                Definition::builtin(
                    Common,
                    "tar",
                    &create_args(&["-cpzf"]),
                    "GZIP",
                    &["tar.gz"],
                    &["tar", "gzip"],
                ),
            ),
            (
                "squashfs",
                Definition::builtin(
                    Squashfs,
                    "mksquashfs",
                    &[
                        "{{ basedir }}/{{ source }}",
                        "{{ filename }}",
                        "-comp",
                        "xz",
                        "-Xbcj",
                        "{{ arch }}",
                        "-b",
                        "1M",
                    ],
                    "SQUASHFS",
                    &["squashfs", "sfs"],
                    &["mksquashfs"],
                ),
            ),
            (
                "tar_x",
                Definition::builtin(
                    Common,
                    "tar",
                    &create_args(&["--xattrs", "--acls", "-cpf"]),
                    "TAR-XATTRS",
                    &["tar"],
                    &["tar"],
                ),
            ),
            (
                "bzip2_x",
                Definition::builtin(
                    Common,
                    "tar",
                    &create_args(&["--xattrs", "--acls", "-cpjf"]),
                    "BZIP2-XATTRS",
                    &["tar.bz2"],
                    &["tar", "bzip2"],
                ),
            ),
            (
                "gzip_x",
                Definition::builtin(
                    Common,
                    "tar",
                    &create_args(&["--xattrs", "--acls", "-cpzf"]),
                    "GZIP-XATTRS",
                    &["tar.gz"],
                    &["tar", "gzip"],
                ),
            ),
            (
                "xz_x",
                Definition::builtin(
                    Common,
                    "tar",
                    &create_args(&["--xattrs", "--acls", "-cpJf"]),
                    "XZ-XATTRS",
                    &["tar.xz"],
                    &["tar", "xz"],
                ),
            ),
        ];
        Self::from_builtin(
            Kind::Compression,
            "Compression definitions loaded",
            entries,
            COMPRESSOR_SEARCH_ORDER,
        )
    }

    /// Built-in decompression definitions.
    pub fn decompression() -> Self {
        use Handler::*;
        const BZ2: &[&str] = &["bz2", "tar.bz2", "tbz2", "tbz"];
        const XZ: &[&str] = &["xz", "tar.xz", "txz"];
        const GZ: &[&str] = &["gz", "tar.gz", "tgz"];
        const ZST: &[&str] = &["zst", "tar.zst", "tzst"];
        let entries = vec![
            (
                "rsync",
                Definition::builtin(Rsync, "rsync", RSYNC_ARGS, "RSYNC", &[], &["rsync"]),
            ),
            (
                "lbzip2",
                Definition::builtin(
                    Common,
                    "tar",
                    &extract_args(&["{{ decomp_opt }}", "lbzip2", "-xpf"]),
                    "LBZIP2",
                    BZ2,
                    &["tar", "lbzip2"],
                ),
            ),
            (
                "bzip2",
                Definition::builtin(
                    Common,
                    "tar",
                    &extract_args(&["-xpjf"]),
                    "BZIP2",
                    BZ2,
                    &["tar", "bzip2"],
                ),
            ),
            (
                "tar",
                Definition::builtin(Common, "tar", &extract_args(&["-xpf"]), "TAR", &["tar"], &["tar"]),
            ),
            (
                "pixz",
                Definition::builtin(
                    Common,
                    "tar",
                    &extract_args(&["{{ decomp_opt }}", "pixz", "-xpf"]),
                    "PIXZ",
                    XZ,
                    &["tar", "pixz"],
                ),
            ),
            (
                "xz",
                Definition::builtin(Common, "tar", &extract_args(&["-xpJf"]), "XZ", XZ, &["tar", "xz"]),
            ),
            (
                "zstd",
                Definition::builtin(
                    Common,
                    "tar",
                    &extract_args(&["{{ decomp_opt }}", "zstd", "-xpf"]),
                    "ZSTD",
                    ZST,
                    &["tar", "zstd"],
                ),
            ),
            (
                "gzip",
                Definition::builtin(
                    Common,
                    "tar",
                    &extract_args(&["-xpzf"]),
                    "GZIP",
                    GZ,
                    &["tar", "gzip"],
                ),
            ),
            (
                "squashfs",
                Definition::builtin(
                    Common,
                    "unsquashfs",
                    &[OTHER_OPTIONS, "-d", "{{ destination }}", "{{ source }}"],
                    "SQUASHFS",
                    &["squashfs", "sfs"],
                    &["unsquashfs"],
                ),
            ),
            (
                "tar_x",
                Definition::builtin(
                    Common,
                    "tar",
                    &extract_args(&["--xattrs", "--acls", "-xpf"]),
                    "TAR-XATTRS",
                    &["tar"],
                    &["tar"],
                ),
            ),
            (
                "bzip2_x",
                Definition::builtin(
                    Common,
                    "tar",
                    &extract_args(&["--xattrs", "--acls", "-xpjf"]),
                    "BZIP2-XATTRS",
                    BZ2,
                    &["tar", "bzip2"],
                ),
            ),
            (
                "gzip_x",
                Definition::builtin(
                    Common,
                    "tar",
                    &extract_args(&["--xattrs", "--acls", "-xpzf"]),
                    "GZIP-XATTRS",
                    GZ,
                    &["tar", "gzip"],
                ),
            ),
            (
                "xz_x",
                Definition::builtin(
                    Common,
                    "tar",
                    &extract_args(&["--xattrs", "--acls", "-xpJf"]),
                    "XZ-XATTRS",
                    XZ,
                    &["tar", "xz"],
                ),
            ),
        ];
        Self::from_builtin(
            Kind::Decompression,
            "Decompression definitions loaded",
            entries,
            DECOMPRESSOR_SEARCH_ORDER,
        )
    }

    /// Built-in contents listing definitions.
    pub fn contents() -> Self {
        use Handler::*;
        const BZ2: &[&str] = &["tbz2", "tbz", "bz2", "tar.bz2"];
        const XZ: &[&str] = &["txz", "tar.xz", "xz"];
        const GZ: &[&str] = &["tgz", "tar.gz", "gz"];
        const ZST: &[&str] = &["tzst", "tar.zst", "zst"];
        let entries = vec![
            (
                "tar",
                Definition::builtin(Common, "tar", &list_args(&["-tvf"]), "TAR", &["tar"], &["tar"]),
            ),
            (
                "gzip",
                Definition::builtin(Common, "tar", &list_args(&["-tvzf"]), "GZIP", GZ, &["tar", "gzip"]),
            ),
            (
                "lbzip2",
                Definition::builtin(
                    Common,
                    "tar",
                    &list_args(&["{{ decomp_opt }}", "lbzip2", "-tvf"]),
                    "LBZIP2",
                    BZ2,
                    &["tar", "lbzip2"],
                ),
            ),
            (
                "bzip2",
                Definition::builtin(
                    Common,
                    "tar",
                    &list_args(&["-tvjf"]),
                    "BZIP2",
                    BZ2,
                    &["tar", "bzip2"],
                ),
            ),
            (
                "xz",
                Definition::builtin(Common, "tar", &list_args(&["-tvJf"]), "XZ", XZ, &["tar", "xz"]),
            ),
            (
                "pixz",
                Definition::builtin(
                    Common,
                    "tar",
                    &list_args(&["{{ decomp_opt }}", "pixz", "-tvf"]),
                    "PIXZ",
                    XZ,
                    &["tar", "pixz"],
                ),
            ),
            (
                "zstd",
                Definition::builtin(
                    Common,
                    "tar",
                    &list_args(&["{{ decomp_opt }}", "zstd", "-tvf"]),
                    "ZSTD",
                    ZST,
                    &["tar", "zstd"],
                ),
            ),
            (
                "isoinfo_l",
                Definition::builtin(
                    Common,
                    "isoinfo",
                    &["-l", "-i", "{{ source }}"],
                    "ISOINFO",
                    &["iso"],
                    &["isoinfo"],
                ),
            ),
            (
                "isoinfo_f",
                Definition::builtin(
                    Common,
                    "isoinfo",
                    &["-f", "-i", "{{ source }}"],
                    "ISOINFO",
                    &["iso"],
                    &["isoinfo"],
                ),
            ),
            (
                "squashfs",
                Definition::builtin(
                    Common,
                    "unsquashfs",
                    &["-ll", "{{ source }}"],
                    "SQUASHFS",
                    &["squashfs", "sfs"],
                    &["unsquashfs"],
                ),
            ),
        ];
        Self::from_builtin(
            Kind::Contents,
            "Contents definitions loaded",
            entries,
            CONTENTS_SEARCH_ORDER,
        )
    }

    /// Built-in set for `kind`.
    pub fn builtin(kind: Kind) -> Self {
        match kind {
            Kind::Compression => Self::compression(),
            Kind::Decompression => Self::decompression(),
            Kind::Contents => Self::contents(),
        }
    }

    /// Parses a custom definition set from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: DefinitionFile =
            toml::from_str(content).context("Failed to parse definition TOML")?;
        let search_order = match file.search_order {
            Some(order) => order,
            // Modes without extensions (rsync) can never be auto-detected.
            None => file
                .definitions
                .iter()
                .filter(|(_, def)| !def.extensions.is_empty())
                .map(|(name, _)| name.clone())
                .collect(),
        };
        let set = Self {
            kind: file.kind,
            description: file
                .description
                .unwrap_or_else(|| format!("{} definitions loaded", file.kind)),
            definitions: file.definitions,
            search_order,
        };
        set.validate_order(&set.search_order)?;
        debug!(
            "Loaded {} custom {} definitions",
            set.definitions.len(),
            set.kind
        );
        Ok(set)
    }

    /// Reads and parses a custom definition file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read definition file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid definition file: {}", path.display()))
    }

    /// Errors when `order` names a mode this set does not define.
    pub fn validate_order(&self, order: &[String]) -> Result<()> {
        for mode in order {
            if !self.definitions.contains_key(mode) {
                return Err(anyhow!(DecompError::Config(format!(
                    "search order names unknown {} mode '{}'",
                    self.kind, mode
                ))));
            }
        }
        Ok(())
    }

    /// Union of the binaries required by the modes in `order`.
    pub fn binaries(&self, order: &[String]) -> BTreeSet<String> {
        order
            .iter()
            .filter_map(|mode| self.definitions.get(mode))
            .flat_map(|def| def.binaries.iter().cloned())
            .collect()
    }

    pub fn get(&self, mode: &str) -> Option<&Definition> {
        self.definitions.get(mode)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_builtin_search_orders_reference_known_modes() {
        for kind in [Kind::Compression, Kind::Decompression, Kind::Contents] {
            let set = DefinitionSet::builtin(kind);
            assert_eq!(set.kind, kind);
            assert!(set.validate_order(&set.search_order).is_ok());
        }
    }

    #[test]
    fn test_enabled_requires_all_binaries() {
        let set = DefinitionSet::decompression();
        let gzip = set.get("gzip").unwrap();
        assert!(gzip.enabled(&set_of(&["tar", "gzip", "xz"])));
        assert!(!gzip.enabled(&set_of(&["tar"])));
        assert!(!gzip.enabled(&BTreeSet::new()));
    }

    #[test]
    fn test_compression_templates() {
        let set = DefinitionSet::compression();
        let lbzip2 = set.get("lbzip2").unwrap();
        assert_eq!(
            lbzip2.args,
            vec![
                "other_options",
                "{{ comp_prog }}",
                "lbzip2",
                "-cpf",
                "{{ filename }}",
                "-C",
                "{{ basedir }}",
                "{{ source }}"
            ]
        );
        assert_eq!(lbzip2.extensions, vec!["tar.bz2"]);
        assert_eq!(set.get("squashfs").unwrap().handler, Handler::Squashfs);
        assert_eq!(set.get("rsync").unwrap().handler, Handler::Rsync);
        assert!(set.get("rsync").unwrap().extensions.is_empty());
    }

    #[test]
    fn test_decompression_extensions() {
        let set = DefinitionSet::decompression();
        assert_eq!(set.get("gzip").unwrap().extensions, vec!["gz", "tar.gz", "tgz"]);
        assert_eq!(
            set.get("xz").unwrap().args,
            vec!["other_options", "-xpJf", "{{ source }}", "-C", "{{ destination }}"]
        );
        assert!(!set.search_order.contains(&"rsync".to_string()));
    }

    #[test]
    fn test_tar_flavor_options() {
        assert_eq!(TarFlavor::Linux.comp_prog(), "-I");
        assert_eq!(TarFlavor::Bsd.comp_prog(), "--use-compress-program");
        assert_eq!(TarFlavor::Linux.list_xattrs_opt(), "--xattrs");
        assert_eq!(TarFlavor::Bsd.list_xattrs_opt(), "");
    }

    #[test]
    fn test_binaries_union() {
        let set = DefinitionSet::decompression();
        let order = vec!["gzip".to_string(), "squashfs".to_string(), "nope".to_string()];
        assert_eq!(set.binaries(&order), set_of(&["tar", "gzip", "unsquashfs"]));
    }

    #[test]
    fn test_from_toml_str_defaults_search_order() {
        let toml_content = r#"
            kind = "decompression"

            [definitions.lz4]
            cmd = "tar"
            args = ["other_options", "-I", "lz4", "-xpf", "{{ source }}", "-C", "{{ destination }}"]
            id = "LZ4"
            extensions = ["tar.lz4"]
            binaries = ["tar", "lz4"]

            [definitions.sync]
            handler = "rsync"
            cmd = "rsync"
            args = ["-a", "{{ source }}", "{{ destination }}"]
            id = "RSYNC"
            binaries = ["rsync"]
        "#;
        let set = DefinitionSet::from_toml_str(toml_content).unwrap();
        assert_eq!(set.kind, Kind::Decompression);
        assert_eq!(set.description, "Decompression definitions loaded");
        assert_eq!(set.search_order, vec!["lz4"]);
        assert_eq!(set.get("lz4").unwrap().handler, Handler::Common);
        assert_eq!(set.get("sync").unwrap().handler, Handler::Rsync);
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_search_mode() {
        let toml_content = r#"
            kind = "contents"
            search_order = ["missing"]

            [definitions.tar]
            cmd = "tar"
            args = ["-tvf", "{{ source }}"]
            id = "TAR"
            extensions = ["tar"]
        "#;
        let err = DefinitionSet::from_toml_str(toml_content).unwrap_err();
        assert!(err.to_string().contains("unknown Contents mode 'missing'"));
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_fields() {
        let toml_content = r#"
            kind = "compression"

            [definitions.tar]
            cmd = "tar"
            args = []
            id = "TAR"
            program = "oops"
        "#;
        assert!(DefinitionSet::from_toml_str(toml_content).is_err());
    }
}

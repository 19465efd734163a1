//! # DeComp Compression & Extraction Map
//!
//! File: lib/src/dispatch/compress.rs
//!
//! ## Overview
//!
//! [`CompressMap`] wraps a compression or decompression [`DefinitionSet`] and
//! performs the work: resolve the mode (explicitly, from the default, or by
//! sniffing the source's extension), render the mode's template and run it
//! through the shell.
//!
//! Which operations are available depends on the kind of the loaded set:
//! `compress` needs compression definitions, `extract` needs decompression
//! definitions. `rsync` works with either, as both built-in sets carry it.
//!
//! ```rust,no_run
//! use decomp::core::definitions::DefinitionSet;
//! use decomp::core::templating::Request;
//! use decomp::dispatch::compress::{CompressMap, CompressOptions};
//!
//! # fn main() -> decomp::core::error::Result<()> {
//! let extractor = CompressMap::new(DefinitionSet::decompression(), CompressOptions::default())?;
//! extractor.extract(&Request::new("/var/tmp/stage3.tar.xz").destination("/mnt/gentoo"))?;
//! # Ok(())
//! # }
//! ```
//!
use crate::common::{process::ShellRunner, system};
use crate::core::definitions::{Definition, DefinitionSet, Handler, Kind, TarFlavor, EXTENSION_SEPARATOR};
use crate::core::error::{DecompError, Result};
use crate::core::templating::{render_command_line, Request};
use crate::dispatch::resolve;
use anyhow::anyhow;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Mode that asks the map to sniff the mode from the source filename.
pub const AUTO_MODE: &str = "auto";

/// Default mode of compression maps.
pub const DEFAULT_COMPRESSION_MODE: &str = "bzip2";

/// Construction options for [`CompressMap`].
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// Extra environment variables for the subprocesses.
    pub env: HashMap<String, String>,
    /// Defaults to `bzip2` for compression and `auto` for decompression.
    pub default_mode: Option<String>,
    /// Separator used by auto-extension.
    pub separator: String,
    /// Defaults to the definition set's own search order.
    pub search_order: Option<Vec<String>>,
    pub tar_flavor: TarFlavor,
    pub shell: PathBuf,
    /// Run the shell with `-x`.
    pub trace: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        let runner = ShellRunner::default();
        Self {
            env: HashMap::new(),
            default_mode: None,
            separator: EXTENSION_SEPARATOR.to_string(),
            search_order: None,
            tar_flavor: TarFlavor::default(),
            shell: runner.shell,
            trace: false,
        }
    }
}

/// Compression or decompression dispatcher over one definition set.
#[derive(Debug, Clone)]
pub struct CompressMap {
    set: DefinitionSet,
    mode: String,
    separator: String,
    search_order: Vec<String>,
    tar_flavor: TarFlavor,
    runner: ShellRunner,
    available: BTreeSet<String>,
}

impl CompressMap {
    /// Builds the map and probes `PATH` for the binaries of the search order.
    pub fn new(set: DefinitionSet, options: CompressOptions) -> Result<Self> {
        let order = options
            .search_order
            .clone()
            .unwrap_or_else(|| set.search_order.clone());
        let available = system::check_available(set.binaries(&order));
        Self::with_available(set, options, available)
    }

    /// Builds the map with a known set of available binaries instead of
    /// probing the host.
    pub fn with_available(
        set: DefinitionSet,
        options: CompressOptions,
        available: BTreeSet<String>,
    ) -> Result<Self> {
        if set.kind == Kind::Contents {
            return Err(anyhow!(DecompError::WrongKind {
                expected: Kind::Decompression,
                actual: Kind::Contents,
            }));
        }
        let search_order = options
            .search_order
            .unwrap_or_else(|| set.search_order.clone());
        set.validate_order(&search_order)?;
        if options.separator.is_empty() {
            return Err(anyhow!(DecompError::Config(
                "extension separator must not be empty".to_string()
            )));
        }

        let mode = options.default_mode.unwrap_or_else(|| match set.kind {
            Kind::Compression => DEFAULT_COMPRESSION_MODE.to_string(),
            _ => AUTO_MODE.to_string(),
        });
        info!(
            "CompressMap: {} ({}), search_order = {:?}",
            set.kind, set.description, search_order
        );
        debug!("CompressMap: available binaries = {:?}", available);

        Ok(Self {
            set,
            mode,
            separator: options.separator,
            search_order,
            tar_flavor: options.tar_flavor,
            runner: ShellRunner {
                shell: options.shell,
                env: options.env,
                trace: options.trace,
            },
            available,
        })
    }

    pub fn kind(&self) -> Kind {
        self.set.kind
    }

    pub fn description(&self) -> &str {
        &self.set.description
    }

    pub fn default_mode(&self) -> &str {
        &self.mode
    }

    pub fn search_order(&self) -> &[String] {
        &self.search_order
    }

    pub fn tar_flavor(&self) -> TarFlavor {
        self.tar_flavor
    }

    /// Binaries of the search order that were found on the host.
    pub fn available_binaries(&self) -> &BTreeSet<String> {
        &self.available
    }

    /// Every mode name in the loaded definitions.
    pub fn available_modes(&self) -> Vec<&str> {
        self.set.definitions.keys().map(String::as_str).collect()
    }

    pub fn definition(&self, mode: &str) -> Option<&Definition> {
        self.set.get(mode)
    }

    pub fn is_supported(&self, mode: &str) -> bool {
        self.set.definitions.contains_key(mode)
    }

    /// The extension auto-extension appends for `mode`.
    pub fn extension(&self, mode: &str) -> Option<&str> {
        self.extensions(mode)
            .and_then(|exts| exts.first())
            .map(String::as_str)
    }

    /// All extensions recognised by `mode`.
    pub fn extensions(&self, mode: &str) -> Option<&[String]> {
        self.set.get(mode).map(|def| def.extensions.as_slice())
    }

    /// Ordered, de-duplicated extensions of the modes in `search_order`.
    pub fn search_order_extensions(&self, search_order: &[String]) -> Vec<String> {
        resolve::search_order_extensions(&self.set.definitions, search_order)
    }

    pub fn get_extension(source: &str) -> Option<String> {
        resolve::get_extension(source)
    }

    /// Picks the mode for `source` from its extension.
    pub fn determine_mode(&self, source: &str) -> Option<String> {
        info!("CompressMap: determine_mode(), source = {}", source);
        resolve::determine_mode(
            &self.set.definitions,
            &self.search_order,
            &self.available,
            source,
        )
    }

    /// Compresses `request.source` into `request.filename`.
    pub fn compress(&self, request: &Request) -> Result<()> {
        self.require_kind(Kind::Compression)?;
        let resolved = self.resolve_compress(request);
        self.run(&resolved)
    }

    /// Extracts `request.source` into `request.destination`.
    pub fn extract(&self, request: &Request) -> Result<()> {
        self.require_kind(Kind::Decompression)?;
        let resolved = self.resolve_extract(request)?;
        self.run(&resolved)
    }

    /// Synchronises `source` into `destination` with rsync.
    pub fn rsync(&self, source: &str, destination: &str) -> Result<()> {
        let request = Request::new(source).destination(destination).mode("rsync");
        self.run(&request)
    }

    /// Resolves the mode and renders the command `compress`/`extract` would
    /// run, without running it.
    pub fn command_line(&self, request: &Request) -> Result<String> {
        let resolved = match self.set.kind {
            Kind::Compression => self.resolve_compress(request),
            _ => self.resolve_extract(request)?,
        };
        self.render(&resolved).map(|(line, _)| line)
    }

    fn require_kind(&self, expected: Kind) -> Result<()> {
        if self.set.kind != expected {
            return Err(anyhow!(DecompError::WrongKind {
                expected,
                actual: self.set.kind,
            }));
        }
        Ok(())
    }

    fn resolve_compress(&self, request: &Request) -> Request {
        let mut resolved = request.clone();
        if resolved.mode.is_none() {
            resolved.mode = Some(self.mode.clone());
        }
        if resolved.basedir.is_none() {
            resolved.basedir = Some(".".to_string());
        }
        resolved
    }

    fn resolve_extract(&self, request: &Request) -> Result<Request> {
        let mut resolved = request.clone();
        let mode = resolved.mode.clone().unwrap_or_else(|| self.mode.clone());
        let mode = if mode == AUTO_MODE {
            let source = resolved.source.clone().unwrap_or_default();
            self.determine_mode(&source).ok_or_else(|| {
                error!("{} Error: No mode was passed in or automatically detected", self.set.kind);
                anyhow!(DecompError::NoModeDetected {
                    kind: self.set.kind,
                    source_path: source,
                })
            })?
        } else {
            mode
        };
        resolved.mode = Some(mode);
        Ok(resolved)
    }

    fn render(&self, request: &Request) -> Result<(String, &Definition)> {
        let mode = request.mode.as_deref().unwrap_or(&self.mode);
        let def = self.set.get(mode).ok_or_else(|| {
            error!(
                "mode: {} is not supported in the current {}",
                mode, self.set.description
            );
            anyhow!(DecompError::UnsupportedMode {
                mode: mode.to_string(),
                kind: self.set.kind,
            })
        })?;
        if mode.ends_with("_x") {
            warn!("Deprecation Warning, all (de)compressor modes ending with '_x'");
            warn!("Please use the 'other_options' capability in the non '*_x' modes");
        }
        debug!("other_options: {:?}", request.other_options);

        let mut request = request.clone();
        if request.auto_extension {
            if let (Some(filename), Some(ext)) = (request.filename.as_mut(), def.extensions.first()) {
                filename.push_str(&self.separator);
                filename.push_str(ext);
            }
        }

        let args = match def.handler {
            Handler::Squashfs if request.arch.as_deref().unwrap_or("").is_empty() => def
                .args
                .iter()
                .filter(|arg| arg.as_str() != "-Xbcj" && arg.as_str() != "{{ arch }}")
                .cloned()
                .collect(),
            _ => def.args.clone(),
        };
        let line = render_command_line(&def.cmd, &args, &request, self.tar_flavor)?;
        Ok((line, def))
    }

    fn run(&self, request: &Request) -> Result<()> {
        let (line, def) = self.render(request)?;
        debug!(
            "CompressMap, running {} process ({:?}): {}",
            self.set.kind, def.handler, line
        );
        if self.runner.run(&line, &def.id)? {
            Ok(())
        } else {
            error!("{} command failed: {}", def.id, line);
            Err(anyhow!(DecompError::CommandFailed {
                id: def.id.clone(),
                command: line,
            }))
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use crate::common::system::tests::fake_executable;
    #[cfg(unix)]
    use std::fs;
    use std::io;
    use std::sync::{Arc, Mutex};
    #[cfg(unix)]
    use tempfile::tempdir;
    use tracing_subscriber::fmt::MakeWriter;

    fn everything() -> BTreeSet<String> {
        [
            "tar", "bzip2", "lbzip2", "gzip", "xz", "pixz", "zstd", "mksquashfs", "unsquashfs",
            "rsync",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn extractor(available: BTreeSet<String>) -> CompressMap {
        CompressMap::with_available(
            DefinitionSet::decompression(),
            CompressOptions::default(),
            available,
        )
        .unwrap()
    }

    fn compressor() -> CompressMap {
        CompressMap::with_available(
            DefinitionSet::compression(),
            CompressOptions::default(),
            everything(),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_depend_on_kind() {
        assert_eq!(compressor().default_mode(), "bzip2");
        assert_eq!(extractor(everything()).default_mode(), "auto");
        assert_eq!(compressor().kind(), Kind::Compression);
    }

    #[test]
    fn test_contents_set_is_rejected() {
        let result = CompressMap::with_available(
            DefinitionSet::contents(),
            CompressOptions::default(),
            everything(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_search_order_mode_is_rejected() {
        let options = CompressOptions {
            search_order: Some(vec!["gzip".to_string(), "rar".to_string()]),
            ..Default::default()
        };
        let err = CompressMap::with_available(DefinitionSet::decompression(), options, everything())
            .unwrap_err();
        assert!(err.to_string().contains("'rar'"));
    }

    #[test]
    fn test_extension_helpers() {
        let map = compressor();
        assert!(map.is_supported("squashfs"));
        assert!(!map.is_supported("rar"));
        assert_eq!(map.extension("gzip"), Some("tar.gz"));
        assert_eq!(map.extension("rsync"), None);
        assert_eq!(
            map.extensions("squashfs").unwrap(),
            &["squashfs".to_string(), "sfs".to_string()]
        );
        assert_eq!(CompressMap::get_extension("a/b.tar.gz").as_deref(), Some(".gz"));
        assert!(map.available_modes().contains(&"xz_x"));
    }

    #[test]
    fn test_compress_command_line_with_auto_extension() {
        let map = compressor();
        let request = Request::new("stage3")
            .filename("/out/stage3-amd64")
            .basedir("/var/tmp/catalyst")
            .mode("gzip")
            .auto_extension(true);
        assert_eq!(
            map.command_line(&request).unwrap(),
            "tar -cpzf /out/stage3-amd64.tar.gz -C /var/tmp/catalyst stage3"
        );
    }

    #[test]
    fn test_compress_default_mode_and_basedir() {
        let map = compressor();
        let request = Request::new("rootfs").filename("rootfs.tar.bz2");
        assert_eq!(
            map.command_line(&request).unwrap(),
            "tar -cpjf rootfs.tar.bz2 -C . rootfs"
        );
    }

    #[test]
    fn test_squashfs_drops_bcj_without_arch() {
        let map = compressor();
        let request = Request::new("image").filename("livecd").basedir("/tmp").mode("squashfs");
        assert_eq!(
            map.command_line(&request).unwrap(),
            "mksquashfs /tmp/image livecd -comp xz -b 1M"
        );
        let request = request.arch("x86").auto_extension(true);
        assert_eq!(
            map.command_line(&request).unwrap(),
            "mksquashfs /tmp/image livecd.squashfs -comp xz -Xbcj x86 -b 1M"
        );
    }

    #[test]
    fn test_extract_auto_detects_mode() {
        let map = extractor(everything());
        let request = Request::new("/tmp/portage.tar.xz")
            .destination("/var/db/repos")
            .other_options(["--no-same-owner"]);
        assert_eq!(
            map.command_line(&request).unwrap(),
            "tar --no-same-owner -I pixz -xpf /tmp/portage.tar.xz -C /var/db/repos"
        );
    }

    #[test]
    fn test_extract_without_detectable_mode() {
        let map = extractor(["tar".to_string()].into_iter().collect());
        let err = map
            .extract(&Request::new("/tmp/portage.tar.xz").destination("/tmp/out"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DecompError>(),
            Some(DecompError::NoModeDetected { .. })
        ));
    }

    #[test]
    fn test_unsupported_mode() {
        let map = extractor(everything());
        let err = map
            .command_line(&Request::new("a.rar").destination("out").mode("rar"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DecompError>(),
            Some(DecompError::UnsupportedMode { .. })
        ));
    }

    #[test]
    fn test_wrong_kind_operations() {
        let err = extractor(everything())
            .compress(&Request::new("dir").filename("dir.tar"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DecompError>(),
            Some(DecompError::WrongKind { .. })
        ));
        let err = compressor()
            .extract(&Request::new("a.tar").destination("out"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DecompError>(),
            Some(DecompError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_bsd_flavor_in_templates() {
        let options = CompressOptions {
            tar_flavor: TarFlavor::Bsd,
            ..Default::default()
        };
        let map = CompressMap::with_available(DefinitionSet::decompression(), options, everything())
            .unwrap();
        assert_eq!(
            map.command_line(&Request::new("a.tbz2").destination("out")).unwrap(),
            "tar --use-compress-program lbzip2 -xpf a.tbz2 -C out"
        );
    }

    #[test]
    fn test_other_options_reach_the_tool_verbatim() {
        let map = extractor(everything());
        let request = Request::new("a.tar")
            .destination("out")
            .mode("tar")
            .other_options(["--label={{ source }}", "--transform=s/{{x/y/"]);
        assert_eq!(
            map.command_line(&request).unwrap(),
            "tar --label={{ source }} --transform=s/{{x/y/ -xpf a.tar -C out"
        );
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn warnings_while<T>(f: impl FnOnce() -> T) -> (T, String) {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::WARN)
            .finish();
        let value = tracing::subscriber::with_default(subscriber, f);
        let text = String::from_utf8_lossy(&logs.0.lock().unwrap()).into_owned();
        (value, text)
    }

    #[test]
    fn test_xattr_modes_warn_about_deprecation() {
        let map = compressor();
        let request = Request::new("rootfs").filename("stage3").mode("xz_x").auto_extension(true);
        let (line, logs) = warnings_while(|| map.command_line(&request).unwrap());
        assert_eq!(line, "tar --xattrs --acls -cpJf stage3.tar.xz -C . rootfs");
        assert!(logs.contains("Deprecation Warning"));
        assert!(logs.contains("other_options"));

        let request = Request::new("rootfs").filename("stage3.tar.xz").mode("xz");
        let (_, logs) = warnings_while(|| map.command_line(&request).unwrap());
        assert!(!logs.contains("Deprecation Warning"));
    }

    /// Runs a custom definition whose "tool" is a fake executable on a
    /// private PATH, so no real archiver is needed.
    #[cfg(unix)]
    #[test]
    fn test_extract_runs_command_and_reports_failure() {
        let bin_dir = tempdir().unwrap();
        let work = tempdir().unwrap();
        fake_executable(bin_dir.path(), "fakeunpack", "cp \"$1\" \"$2\"");
        fake_executable(bin_dir.path(), "fakefail", "exit 1");

        let definitions = format!(
            r#"
            kind = "decompression"
            search_order = ["fake", "broken"]

            [definitions.fake]
            cmd = "{bin}/fakeunpack"
            args = ["{{{{ source }}}}", "{{{{ destination }}}}"]
            id = "FAKE"
            extensions = ["fake"]
            binaries = ["fakeunpack"]

            [definitions.broken]
            cmd = "{bin}/fakefail"
            args = ["{{{{ source }}}}"]
            id = "BROKEN"
            extensions = ["broken"]
            binaries = ["fakefail"]
            "#,
            bin = bin_dir.path().display()
        );
        let set = DefinitionSet::from_toml_str(&definitions).unwrap();
        let available = system::check_available_in(set.binaries(&set.search_order), bin_dir.path());
        let options = CompressOptions {
            shell: PathBuf::from("/bin/sh"),
            ..Default::default()
        };
        let map = CompressMap::with_available(set, options, available).unwrap();

        let source = work.path().join("data.fake");
        let target = work.path().join("copied");
        fs::write(&source, "payload").unwrap();
        map.extract(
            &Request::new(source.display().to_string()).destination(target.display().to_string()),
        )
        .unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "payload");

        let err = map
            .extract(&Request::new("x.broken").destination("unused"))
            .unwrap_err();
        match err.downcast_ref::<DecompError>() {
            Some(DecompError::CommandFailed { id, .. }) => assert_eq!(id, "BROKEN"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

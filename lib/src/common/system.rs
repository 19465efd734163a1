//! # DeComp System Utilities (`common::system`)
//!
//! File: lib/src/common/system.rs
//!
//! ## Overview
//!
//! Checks which of a mode's required binaries are installed. A binary counts
//! as available when it resolves on `PATH` to an executable file; resolution
//! is delegated to the `which` crate.
//!
//! ```rust
//! use decomp::common::system;
//!
//! let available = system::check_available(["tar", "gzip", "nonexistentcommand12345"]);
//! assert!(!available.contains("nonexistentcommand12345"));
//! ```
//!
use std::collections::BTreeSet;
use std::ffi::OsStr;
use tracing::debug;

/// Returns the subset of `binaries` found on the process `PATH`.
pub fn check_available<I, S>(binaries: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    binaries
        .into_iter()
        .filter_map(|bin| {
            let name = bin.as_ref();
            match which::which(name) {
                Ok(path) => {
                    debug!("Found '{}' at {}", name, path.display());
                    Some(name.to_string())
                }
                Err(e) => {
                    debug!("Binary '{}' not available: {}", name, e);
                    None
                }
            }
        })
        .collect()
}

/// Like [`check_available`], but searches `search_path` (a `PATH`-style list)
/// instead of the process `PATH`.
pub fn check_available_in<I, S, P>(binaries: I, search_path: P) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    P: AsRef<OsStr>,
{
    let cwd = std::env::current_dir().unwrap_or_default();
    binaries
        .into_iter()
        .filter_map(|bin| {
            let name = bin.as_ref();
            match which::which_in(name, Some(search_path.as_ref()), &cwd) {
                Ok(path) => {
                    debug!("Found '{}' at {}", name, path.display());
                    Some(name.to_string())
                }
                Err(_) => {
                    debug!("Binary '{}' not found in custom search path", name);
                    None
                }
            }
        })
        .collect()
}

// --- Unit Tests ---
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    /// Writes an executable shell script named `name` into `dir`.
    #[cfg(unix)]
    pub(crate) fn fake_executable(dir: &Path, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_check_available_missing_binary() {
        let available = check_available(["nonexistentcommand12345"]);
        assert!(available.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_check_available_in_custom_path() {
        let bin_dir = tempdir().unwrap();
        fake_executable(bin_dir.path(), "fakezip", "exit 0");
        // Present but not executable.
        fs::write(bin_dir.path().join("notexec"), "data").unwrap();

        let available = check_available_in(
            ["fakezip", "notexec", "fakezip", "absent"],
            bin_dir.path(),
        );
        assert_eq!(available.len(), 1);
        assert!(available.contains("fakezip"));
    }
}

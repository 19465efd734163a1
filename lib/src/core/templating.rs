//! # DeComp Command Templates
//!
//! File: lib/src/core/templating.rs
//!
//! ## Overview
//!
//! Turns a definition's argument template into a command line. Each template
//! token is rendered with the Tera engine against the values of a
//! [`Request`] plus the option spellings of the configured [`TarFlavor`].
//!
//! [`render_command_line`] renders the definition's own tokens and splices
//! the caller's options into the `other_options` placeholder as they are,
//! so an option like `--transform=s/{{x/y/` reaches the tool untouched.
//! Tokens that come out empty are dropped. [`substitute_other_options`]
//! performs only the splicing step, for callers that render separately.
//!
//! A template referencing a value the request does not carry (say
//! `{{ destination }}` for a request without one) fails with a template
//! error instead of producing a half-filled command.
//!
//! ```rust
//! use decomp::core::definitions::TarFlavor;
//! use decomp::core::templating::{render_command_line, Request};
//!
//! let request = Request::new("/tmp/stage3.tar.xz").destination("/mnt/root");
//! let args = vec!["-xpJf".to_string(), "{{ source }}".to_string(), "-C".to_string(),
//!                 "{{ destination }}".to_string()];
//! let line = render_command_line("tar", &args, &request, TarFlavor::Linux).unwrap();
//! assert_eq!(line, "tar -xpJf /tmp/stage3.tar.xz -C /mnt/root");
//! ```
//!
use crate::core::definitions::{TarFlavor, OTHER_OPTIONS};
use crate::core::error::{DecompError, Result};
use anyhow::anyhow;
use tera::Tera;
use tracing::debug;

/// The values substituted into a command template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub source: Option<String>,
    pub destination: Option<String>,
    /// Directory the compressor changes into before archiving `source`.
    pub basedir: Option<String>,
    /// Archive to create.
    pub filename: Option<String>,
    /// Mode to use; `None` means the map's default mode.
    pub mode: Option<String>,
    /// Append the mode's first extension to `filename`.
    pub auto_extension: bool,
    /// Target architecture (used by squashfs BCJ filters).
    pub arch: Option<String>,
    pub other_options: Vec<String>,
}

impl Request {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Default::default()
        }
    }

    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn basedir(mut self, basedir: impl Into<String>) -> Self {
        self.basedir = Some(basedir.into());
        self
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn auto_extension(mut self, enabled: bool) -> Self {
        self.auto_extension = enabled;
        self
    }

    pub fn arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }

    pub fn other_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.other_options = options.into_iter().map(Into::into).collect();
        self
    }

    fn tera_context(&self, flavor: TarFlavor) -> tera::Context {
        let mut context = tera::Context::new();
        let optional = [
            ("source", &self.source),
            ("destination", &self.destination),
            ("basedir", &self.basedir),
            ("filename", &self.filename),
            ("mode", &self.mode),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                context.insert(key, value);
            }
        }
        context.insert("arch", self.arch.as_deref().unwrap_or(""));
        context.insert("comp_prog", flavor.comp_prog());
        context.insert("decomp_opt", flavor.decomp_opt());
        context.insert("list_xattrs_opt", flavor.list_xattrs_opt());
        context
    }
}

/// Replaces the `other_options` token and drops empty tokens.
pub fn substitute_other_options(args: &[String], other_options: &[String]) -> Vec<String> {
    let joined = other_options.join(" ");
    args.iter()
        .map(|arg| {
            if arg == OTHER_OPTIONS {
                joined.clone()
            } else {
                arg.clone()
            }
        })
        .filter(|arg| !arg.is_empty())
        .collect()
}

/// Renders each template token. Tokens that render to nothing are dropped.
pub fn render_args(args: &[String], request: &Request, flavor: TarFlavor) -> Result<Vec<String>> {
    let context = request.tera_context(flavor);
    let mut rendered = Vec::with_capacity(args.len());
    for arg in args {
        if let Some(value) = render_token(arg, &context)? {
            rendered.push(value);
        }
    }
    Ok(rendered)
}

fn render_token(arg: &str, context: &tera::Context) -> Result<Option<String>> {
    if !arg.contains("{{") {
        return Ok(Some(arg.to_string()).filter(|a| !a.is_empty()));
    }
    let value = Tera::one_off(arg, context, false).map_err(|e| {
        anyhow!(DecompError::Template { source: e })
            .context(format!("Failed to render template token '{}'", arg))
    })?;
    Ok(Some(value).filter(|v| !v.is_empty()))
}

/// Renders a complete command line: `cmd` followed by the rendered arguments.
///
/// The definition's tokens are rendered; the caller's `other_options` are
/// spliced into the `other_options` placeholder verbatim.
pub fn render_command_line(
    cmd: &str,
    args: &[String],
    request: &Request,
    flavor: TarFlavor,
) -> Result<String> {
    let context = request.tera_context(flavor);
    let other_options = request.other_options.join(" ");
    let mut parts = vec![cmd.to_string()];
    for arg in args {
        if arg == OTHER_OPTIONS {
            if !other_options.is_empty() {
                parts.push(other_options.clone());
            }
        } else if let Some(value) = render_token(arg, &context)? {
            parts.push(value);
        }
    }
    let line = parts.join(" ");
    debug!("Rendered command line: {}", line);
    Ok(line)
}

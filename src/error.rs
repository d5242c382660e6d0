//! Error types for the md2pdf library.
//!
//! Every failure in the pipeline is fatal: there is no partial document and
//! no retry. The variants are grouped by where in the pipeline they arise so
//! callers (the CLI, or an embedding application) can decide how to report
//! them:
//!
//! * **Configuration**: detected before any file is touched.
//! * **Resource**: a required file (source, fragment, stylesheet, layout)
//!   could not be read.
//! * **Template / conversion**: a layout failed to compile or render.
//! * **Render**: the rendering backend failed to launch, navigate or export,
//!   or the scratch/destination file could not be written.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// What a [`Md2PdfError::ResourceRead`] was trying to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Source,
    Header,
    Footer,
    Stylesheet,
    Layout,
    Script,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Source => "source document",
            ResourceKind::Header => "header fragment",
            ResourceKind::Footer => "footer fragment",
            ResourceKind::Stylesheet => "stylesheet",
            ResourceKind::Layout => "layout template",
            ResourceKind::Script => "script",
        };
        f.write_str(name)
    }
}

/// All errors returned by the md2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No source document was configured.
    #[error("Source path must be provided")]
    MissingSource,

    /// No destination was configured and none could be derived.
    #[error("Destination path must be provided")]
    MissingDestination,

    /// Builder or option validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Resource errors ───────────────────────────────────────────────────
    /// A required input file could not be read.
    #[error("Failed to read {kind} '{path}': {source}")]
    ResourceRead {
        kind: ResourceKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Template / conversion errors ──────────────────────────────────────
    /// A layout template failed to compile or render.
    #[error("Layout template '{name}' failed: {detail}")]
    Template { name: String, detail: String },

    /// Markdown could not be converted to HTML.
    #[error("Markdown conversion failed: {0}")]
    Conversion(String),

    // ── Render errors ─────────────────────────────────────────────────────
    /// The rendering backend could not be started.
    #[error(
        "Failed to launch the rendering backend: {0}\n\
Make sure Chrome or Chromium is installed, or point --chrome / CHROME at the executable."
    )]
    BackendLaunch(String),

    /// The backend could not load the assembled document.
    #[error("Failed to load '{url}' in the rendering backend: {detail}")]
    Navigation { url: String, detail: String },

    /// The backend loaded the page but could not export it.
    #[error("PDF export failed: {0}")]
    Export(String),

    /// The scratch HTML file could not be written, renamed or removed.
    #[error("Scratch file '{path}' could not be handled: {source}")]
    ScratchFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the destination file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Md2PdfError {
    /// Shorthand for mapping an `io::Error` from reading one of the inputs.
    pub(crate) fn read(
        kind: ResourceKind,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Md2PdfError::ResourceRead { kind, path, source }
    }

    /// `true` for errors raised before any file was read or written.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Md2PdfError::MissingSource | Md2PdfError::MissingDestination | Md2PdfError::InvalidConfig(_)
        )
    }

    /// Wrap a Tera failure for the named layout.
    pub(crate) fn template(name: &str, err: tera::Error) -> Self {
        // Tera nests the useful message in the source chain.
        let mut detail = err.to_string();
        let mut cause = std::error::Error::source(&err);
        while let Some(inner) = cause {
            detail.push_str(": ");
            detail.push_str(&inner.to_string());
            cause = inner.source();
        }
        Md2PdfError::Template {
            name: name.to_string(),
            detail,
        }
    }
}

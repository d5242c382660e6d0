//! Progress-callback trait for per-stage conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to be told
//! when each pipeline stage starts and finishes. The CLI uses it to drive its
//! spinner; an embedding application can forward the events anywhere.
//!
//! # Example
//!
//! ```rust
//! use md2pdf::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{stage}…");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Select and read the stylesheets.
    Styles,
    /// Compose the running header.
    Header,
    /// Compose the running footer.
    Footer,
    /// Read, convert and qualify the markdown body.
    Body,
    /// Render the document layout.
    Layout,
    /// Hand the document to the rendering backend and write the PDF.
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Styles => "Loading styles",
            Stage::Header => "Preparing header",
            Stage::Footer => "Preparing footer",
            Stage::Body => "Converting markdown",
            Stage::Layout => "Assembling document",
            Stage::Render => "Rendering PDF",
        };
        f.write_str(name)
    }
}

/// Called by the conversion pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Separate conversions may run on different threads,
/// hence `Send + Sync`.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called when `stage` begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when `stage` finished without error.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called once the destination file has been written.
    fn on_conversion_complete(&self, destination: &Path) {
        let _ = destination;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Fires stage events on an optional callback.
#[derive(Clone, Copy)]
pub(crate) struct StageReporter<'a> {
    callback: Option<&'a ProgressCallback>,
}

impl<'a> StageReporter<'a> {
    pub(crate) fn new(callback: Option<&'a ProgressCallback>) -> Self {
        Self { callback }
    }

    pub(crate) fn start(&self, stage: Stage) -> Instant {
        tracing::debug!("{stage}");
        if let Some(cb) = self.callback {
            cb.on_stage_start(stage);
        }
        Instant::now()
    }

    pub(crate) fn complete(&self, stage: Stage, started: Instant) {
        if let Some(cb) = self.callback {
            cb.on_stage_complete(stage, started.elapsed().as_millis() as u64);
        }
    }

    pub(crate) fn finished(&self, destination: &Path) {
        if let Some(cb) = self.callback {
            cb.on_conversion_complete(destination);
        }
    }
}

//! Conversion entry points.
//!
//! [`convert`] is the one most callers want: it composes the document and
//! renders it with headless Chromium. [`convert_with_backend`] takes any
//! [`RenderBackend`], and [`compose_document`] / [`convert_to_html`] stop
//! before rendering, for previews or for pipelines that print elsewhere.

use crate::backend::RenderBackend;
use crate::config::{ConversionConfig, ConversionRequest};
use crate::error::Md2PdfError;
use crate::pipeline::compose::{compose_with_progress, AssembledDocument};
use crate::pipeline::render;
use crate::progress::{Stage, StageReporter};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Convert a Markdown file to PDF with the default Chromium backend.
///
/// # Returns
/// The destination path.
///
/// # Errors
/// Every failure is fatal:
/// - missing `source`/`destination` (before any I/O)
/// - an unreadable source, fragment, stylesheet or layout
/// - a layout template error
/// - Chromium failing to launch, load or export
///
/// # Example
/// ```rust,no_run
/// use md2pdf::{convert, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::builder()
///     .source("README.md")
///     .destination_from_source()
///     .build()?;
/// let pdf = convert(&config).await?;
/// println!("{}", pdf.display());
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "chromium")]
pub async fn convert(config: &ConversionConfig) -> Result<PathBuf, Md2PdfError> {
    convert_with_backend(config, &crate::backend::ChromiumBackend::default()).await
}

/// Convert a Markdown file to PDF through `backend`.
pub async fn convert_with_backend(
    config: &ConversionConfig,
    backend: &dyn RenderBackend,
) -> Result<PathBuf, Md2PdfError> {
    let total_start = Instant::now();
    let request = ConversionRequest::from_config(config)?;
    let progress = StageReporter::new(config.progress_callback.as_ref());
    info!(
        "Starting conversion: {} → {}",
        request.source.display(),
        request.destination.display()
    );

    let document = compose_with_progress(&request, progress).await?;

    let t = progress.start(Stage::Render);
    let destination = render::dispatch(&document, &request, backend).await?;
    progress.complete(Stage::Render, t);

    info!(
        "Conversion complete: {} ({}ms)",
        destination.display(),
        total_start.elapsed().as_millis()
    );
    progress.finished(&destination);
    Ok(destination)
}

/// Compose the final HTML document without rendering it.
///
/// `destination` is still required: it decides nothing here, but a config
/// that cannot be converted should not compose either.
pub async fn compose_document(config: &ConversionConfig) -> Result<AssembledDocument, Md2PdfError> {
    let request = ConversionRequest::from_config(config)?;
    info!("Composing {}", request.source.display());
    compose_with_progress(&request, StageReporter::new(config.progress_callback.as_ref())).await
}

/// Compose the document and write the HTML itself to the destination.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_html(config: &ConversionConfig) -> Result<PathBuf, Md2PdfError> {
    let request = ConversionRequest::from_config(config)?;
    let progress = StageReporter::new(config.progress_callback.as_ref());
    info!(
        "Composing {} → {}",
        request.source.display(),
        request.destination.display()
    );

    let document = compose_with_progress(&request, progress).await?;
    render::write_destination(&request.destination, document.html.as_bytes()).await?;

    progress.finished(&request.destination);
    Ok(request.destination)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
#[cfg(feature = "chromium")]
pub fn convert_sync(config: &ConversionConfig) -> Result<PathBuf, Md2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(config))
}

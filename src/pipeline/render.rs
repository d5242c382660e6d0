//! Render dispatch: hand the assembled document to a backend and write the PDF.
//!
//! ```text
//! scratch write ──▶ launch ──▶ open ──▶ export ──▶ close ──▶ destination ──▶ scratch cleanup
//! ```
//!
//! Every step awaits the one before it. The scratch file lives beside the
//! destination (see [`ConversionRequest::scratch_path`]) so the backend loads
//! it from the same filesystem the PDF is written to.
//!
//! Scratch cleanup runs whatever the outcome: with a debug path the scratch
//! file is moved there, otherwise it is deleted. When rendering has already
//! failed, a cleanup failure is only logged so the caller sees the render
//! error.

use crate::backend::{BackendSession, PrintSettings, RenderBackend};
use crate::config::ConversionRequest;
use crate::error::Md2PdfError;
use crate::pipeline::compose::AssembledDocument;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

/// Everything one dispatch needs, resolved up front.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub destination: PathBuf,
    pub scratch: PathBuf,
    pub debug: Option<PathBuf>,
    pub settings: PrintSettings,
}

impl RenderJob {
    pub fn new(document: &AssembledDocument, request: &ConversionRequest) -> Result<Self, Md2PdfError> {
        Ok(Self {
            destination: request.destination.clone(),
            scratch: request.scratch_path(),
            debug: request.debug.clone(),
            settings: PrintSettings::new(&request.pdf, &document.header, &document.footer)?,
        })
    }
}

/// Render `document` to `request.destination` through `backend`.
///
/// Returns the destination path. The destination is only created from a
/// complete export; on any failure it is left untouched.
pub async fn dispatch(
    document: &AssembledDocument,
    request: &ConversionRequest,
    backend: &dyn RenderBackend,
) -> Result<PathBuf, Md2PdfError> {
    let job = RenderJob::new(document, request)?;

    write_scratch(&job.scratch, &document.html).await?;

    let outcome = match render(&job, backend).await {
        Ok(pdf) => write_destination(&job.destination, &pdf).await,
        Err(e) => Err(e),
    };
    let cleanup = release_scratch(&job).await;

    match (outcome, cleanup) {
        (Ok(()), Ok(())) => Ok(job.destination),
        (Ok(()), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_err)) => {
            warn!("Scratch cleanup failed after render error: {cleanup_err}");
            Err(e)
        }
    }
}

/// launch → open → export → close. The session is closed even when opening
/// or exporting fails.
async fn render(job: &RenderJob, backend: &dyn RenderBackend) -> Result<Vec<u8>, Md2PdfError> {
    let url = scratch_url(&job.scratch)?;

    let mut session = backend.launch().await?;
    let exported = open_and_export(session.as_mut(), &url, &job.settings).await;
    let closed = session.close().await;

    let pdf = exported?;
    if let Err(e) = closed {
        warn!("Backend did not close cleanly: {e}");
    }
    Ok(pdf)
}

async fn open_and_export(
    session: &mut dyn BackendSession,
    url: &Url,
    settings: &PrintSettings,
) -> Result<Vec<u8>, Md2PdfError> {
    session.open(url).await?;
    session.export(settings).await
}

fn scratch_url(scratch: &Path) -> Result<Url, Md2PdfError> {
    let absolute = std::path::absolute(scratch).map_err(|source| Md2PdfError::ScratchFile {
        path: scratch.to_path_buf(),
        source,
    })?;
    Url::from_file_path(&absolute)
        .map_err(|_| Md2PdfError::Internal(format!("cannot build file URL for '{}'", absolute.display())))
}

async fn write_scratch(scratch: &Path, html: &str) -> Result<(), Md2PdfError> {
    let scratch_err = |source| Md2PdfError::ScratchFile {
        path: scratch.to_path_buf(),
        source,
    };

    if let Some(parent) = scratch.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(scratch_err)?;
    }
    tokio::fs::write(scratch, html).await.map_err(scratch_err)?;
    debug!("Wrote scratch document {} ({} bytes)", scratch.display(), html.len());
    Ok(())
}

/// Atomic write: `<destination>.tmp`, then rename.
pub(crate) async fn write_destination(destination: &Path, bytes: &[u8]) -> Result<(), Md2PdfError> {
    let write_err = |source| Md2PdfError::OutputWriteFailed {
        path: destination.to_path_buf(),
        source,
    };

    let tmp = temp_sibling(destination);
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    tokio::fs::write(&tmp, bytes).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp, destination).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_err(e));
    }
    debug!("Wrote {} ({} bytes)", destination.display(), bytes.len());
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Move the scratch file to the debug path, or delete it.
async fn release_scratch(job: &RenderJob) -> Result<(), Md2PdfError> {
    let scratch_err = |source| Md2PdfError::ScratchFile {
        path: job.scratch.clone(),
        source,
    };

    match job.debug {
        Some(ref keep) => {
            if let Some(parent) = keep.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(scratch_err)?;
            }
            // rename fails across filesystems; fall back to copy + delete.
            if tokio::fs::rename(&job.scratch, keep).await.is_err() {
                tokio::fs::copy(&job.scratch, keep).await.map_err(scratch_err)?;
                tokio::fs::remove_file(&job.scratch).await.map_err(scratch_err)?;
            }
            debug!("Kept intermediate HTML at {}", keep.display());
        }
        None => {
            tokio::fs::remove_file(&job.scratch).await.map_err(scratch_err)?;
        }
    }
    Ok(())
}

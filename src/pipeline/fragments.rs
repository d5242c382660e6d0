//! Running header and footer composition.
//!
//! Header and footer are optional and independent of each other. When a
//! fragment path is configured the file is read, qualified against the
//! request's asset directory, and rendered through its own small layout.
//! A configured path that cannot be read is an error, never "absent".
//!
//! Fragments are HTML. Files with a `.md`/`.markdown` extension are
//! converted first, with the same emoji setting as the body.

use crate::config::ConversionRequest;
use crate::error::{Md2PdfError, ResourceKind};
use crate::pipeline::layout::{Layout, LayoutKind};
use crate::pipeline::markdown::{markdown_to_html, MarkdownOptions};
use crate::pipeline::qualify::qualify;
use std::path::Path;
use tracing::debug;

/// A header or footer: rendered markup, or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Fragment {
    Present(String),
    #[default]
    Absent,
}

impl Fragment {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Fragment::Present(html) => Some(html),
            Fragment::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Fragment::Present(_))
    }
}

/// Compose the running header. `css` is the concatenated stylesheet text;
/// every `"` in it is replaced by `'` before it reaches the layout.
pub async fn prepare_header(request: &ConversionRequest, css: &str) -> Result<Fragment, Md2PdfError> {
    let Some(ref path) = request.header else {
        return Ok(Fragment::Absent);
    };

    let layout = Layout::load(LayoutKind::Header, request.layouts.header.as_deref()).await?;
    let content = read_fragment(path, ResourceKind::Header, request).await?;
    let quote_safe_css = css.replace('"', "'");

    let html = layout.render_header(&content, &quote_safe_css)?;
    debug!("Header prepared from {} ({} bytes)", path.display(), html.len());
    Ok(Fragment::Present(html))
}

/// Compose the running footer.
pub async fn prepare_footer(request: &ConversionRequest) -> Result<Fragment, Md2PdfError> {
    let Some(ref path) = request.footer else {
        return Ok(Fragment::Absent);
    };

    let layout = Layout::load(LayoutKind::Footer, request.layouts.footer.as_deref()).await?;
    let content = read_fragment(path, ResourceKind::Footer, request).await?;

    let html = layout.render_footer(&content)?;
    debug!("Footer prepared from {} ({} bytes)", path.display(), html.len());
    Ok(Fragment::Present(html))
}

/// Read a fragment file and qualify its image references.
async fn read_fragment(
    path: &Path,
    kind: ResourceKind,
    request: &ConversionRequest,
) -> Result<String, Md2PdfError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(Md2PdfError::read(kind, path))?;

    let html = if is_markdown(path) {
        markdown_to_html(&raw, &MarkdownOptions { emoji: request.emoji })?
    } else {
        raw
    };

    Ok(qualify(&html, &request.asset_dir).into_string())
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}

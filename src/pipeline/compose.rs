//! Document composition: everything up to the final HTML string.
//!
//! ```text
//! styles ──▶ header ──▶ footer ──▶ layout ──▶ source ──▶ markdown ──▶ qualify ──▶ render
//!  (pure)     (I/O)      (I/O)      (I/O)      (I/O)      (pure)       (pure)     (pure)
//! ```
//!
//! Every I/O step is awaited before the next begins, and the first failure
//! aborts composition: there is no partial document.

use crate::config::ConversionRequest;
use crate::error::{Md2PdfError, ResourceKind};
use crate::pipeline::fragments::{prepare_footer, prepare_header, Fragment};
use crate::pipeline::layout::{DocumentVars, Layout, LayoutKind};
use crate::pipeline::markdown::{markdown_to_html, MarkdownOptions};
use crate::pipeline::qualify::qualify;
use crate::pipeline::styles::StyleBundle;
use crate::progress::{Stage, StageReporter};
use tracing::debug;
use url::Url;

/// The self-contained HTML handed to the rendering backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    /// The full document: styles, body and any header/footer markup.
    pub html: String,
    /// Rendered running header, also used as the print header.
    pub header: Fragment,
    /// Rendered running footer, also used as the print footer.
    pub footer: Fragment,
    /// Stylesheets applied, in cascade order.
    pub stylesheets: Vec<String>,
}

/// Compose the document for `request`.
pub async fn compose(request: &ConversionRequest) -> Result<AssembledDocument, Md2PdfError> {
    compose_with_progress(request, StageReporter::new(None)).await
}

pub(crate) async fn compose_with_progress(
    request: &ConversionRequest,
    progress: StageReporter<'_>,
) -> Result<AssembledDocument, Md2PdfError> {
    // ── Styles ───────────────────────────────────────────────────────────
    let t = progress.start(Stage::Styles);
    let bundle = StyleBundle::from_config(request);
    let styles = bundle.load().await?;
    progress.complete(Stage::Styles, t);

    // ── Header / footer ──────────────────────────────────────────────────
    let t = progress.start(Stage::Header);
    let header = prepare_header(request, styles.css()).await?;
    progress.complete(Stage::Header, t);

    let t = progress.start(Stage::Footer);
    let footer = prepare_footer(request).await?;
    progress.complete(Stage::Footer, t);

    // ── Layout ───────────────────────────────────────────────────────────
    let layout = Layout::load(LayoutKind::Document, request.layouts.document.as_deref()).await?;

    // ── Body ─────────────────────────────────────────────────────────────
    let t = progress.start(Stage::Body);
    let markdown = tokio::fs::read_to_string(&request.source)
        .await
        .map_err(Md2PdfError::read(ResourceKind::Source, &request.source))?;
    let body_html = markdown_to_html(&markdown, &MarkdownOptions { emoji: request.emoji })?;
    let body = qualify(&body_html, &request.asset_dir);
    debug!(
        "Converted {} ({} bytes markdown → {} bytes HTML)",
        request.source.display(),
        markdown.len(),
        body.as_str().len()
    );
    progress.complete(Stage::Body, t);

    // ── Render layout ────────────────────────────────────────────────────
    let t = progress.start(Stage::Layout);
    let highlight_js = match request.highlight_js {
        Some(ref path) => Some(script_url(path).await?),
        None => None,
    };
    let css = styles.style_block();
    let html = layout.render_document(&DocumentVars {
        body: body.as_str(),
        css: &css,
        header: header.as_deref(),
        footer: footer.as_deref(),
        highlight_js,
    })?;
    progress.complete(Stage::Layout, t);

    Ok(AssembledDocument {
        html,
        header,
        footer,
        stylesheets: bundle.stylesheets(),
    })
}

/// `file://` URL of a local script, which must exist.
async fn script_url(path: &std::path::Path) -> Result<String, Md2PdfError> {
    tokio::fs::metadata(path)
        .await
        .map_err(Md2PdfError::read(ResourceKind::Script, path))?;
    let absolute = std::path::absolute(path).map_err(Md2PdfError::read(ResourceKind::Script, path))?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|_| Md2PdfError::Internal(format!("cannot build file URL for '{}'", absolute.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionConfig;
    use std::path::Path;

    fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, body).unwrap();
        p
    }

    fn request(config: ConversionConfig) -> ConversionRequest {
        ConversionRequest::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn title_only_document() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(dir.path(), "doc.md", "# Title");
        let req = request(
            ConversionConfig::builder()
                .source(&src)
                .destination(dir.path().join("doc.pdf"))
                .build()
                .unwrap(),
        );

        let doc = compose(&req).await.unwrap();
        assert!(doc.html.contains("<html>"));
        assert!(doc.html.contains("<style>"));
        assert!(doc.html.contains("Title</h1>"));
        assert_eq!(doc.header, Fragment::Absent);
        assert_eq!(doc.footer, Fragment::Absent);
        assert!(!doc.html.contains("md2pdf-header"));
        assert!(!doc.html.contains("md2pdf-footer"));
        assert_eq!(
            doc.stylesheets,
            vec!["github-markdown.css", "highlight.css", "default.css"]
        );
    }

    #[tokio::test]
    async fn code_blocks_highlighted_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(dir.path(), "doc.md", "```rust\nfn main() { let x = 1; }\n```\n");
        let req = request(
            ConversionConfig::builder()
                .source(&src)
                .destination(dir.path().join("doc.pdf"))
                .build()
                .unwrap(),
        );

        let doc = compose(&req).await.unwrap();
        assert!(doc.html.contains("<code class=\"language-rust\">"), "got: {}", doc.html);
        assert!(doc.html.contains("<span class=\"hl-"), "got: {}", doc.html);
        assert!(doc.html.contains(".hl-keyword"), "stylesheet should colour the spans");
        assert!(!doc.html.contains("<script"));
    }

    #[tokio::test]
    async fn body_images_are_qualified_against_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        std::fs::create_dir(&docs).unwrap();
        let src = write(&docs, "doc.md", "![pic](img/pic.png)\n\n![remote](https://host/pic.png)");
        let req = request(
            ConversionConfig::builder()
                .source(&src)
                .destination(dir.path().join("out/doc.pdf"))
                .build()
                .unwrap(),
        );

        let doc = compose(&req).await.unwrap();
        let pic = url::Url::from_file_path(docs.join("img/pic.png")).unwrap();
        let expected = format!(r#"src="{pic}""#);
        assert!(doc.html.contains(&expected), "got: {}", doc.html);
        assert!(doc.html.contains(r#"src="https://host/pic.png""#));
    }

    #[tokio::test]
    async fn header_and_footer_are_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(dir.path(), "doc.md", "body");
        let header = write(dir.path(), "h.html", "<b>HEAD</b>");
        let footer = write(dir.path(), "f.html", "<i>FOOT</i>");
        let req = request(
            ConversionConfig::builder()
                .source(&src)
                .destination(dir.path().join("doc.pdf"))
                .header(&header)
                .footer(&footer)
                .build()
                .unwrap(),
        );

        let doc = compose(&req).await.unwrap();
        assert!(doc.header.is_present());
        assert!(doc.footer.is_present());
        assert!(doc.html.contains("md2pdf-header"));
        assert!(doc.html.contains("<b>HEAD</b>"));
        assert!(doc.html.contains("<i>FOOT</i>"));
    }

    #[tokio::test]
    async fn missing_source_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(
            ConversionConfig::builder()
                .source(dir.path().join("missing.md"))
                .destination(dir.path().join("doc.pdf"))
                .build()
                .unwrap(),
        );
        let err = compose(&req).await.unwrap_err();
        assert!(matches!(
            err,
            Md2PdfError::ResourceRead {
                kind: ResourceKind::Source,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn user_style_comes_last() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(dir.path(), "doc.md", "x");
        let css = write(dir.path(), "custom.css", "/* user-sheet */");
        let req = request(
            ConversionConfig::builder()
                .source(&src)
                .destination(dir.path().join("doc.pdf"))
                .styles(&css)
                .build()
                .unwrap(),
        );

        let doc = compose(&req).await.unwrap();
        let base = doc.html.find("GitHub-flavoured base").unwrap();
        let spacing = doc.html.find("Print spacing defaults").unwrap();
        let user = doc.html.find("user-sheet").unwrap();
        assert!(base < spacing && spacing < user);
    }

    #[tokio::test]
    async fn highlight_script_is_referenced_by_url() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(dir.path(), "doc.md", "```js\nlet a = 1;\n```");
        let script = write(dir.path(), "hl.js", "window.hljs = {};");
        let req = request(
            ConversionConfig::builder()
                .source(&src)
                .destination(dir.path().join("doc.pdf"))
                .highlight_js(&script)
                .build()
                .unwrap(),
        );

        let doc = compose(&req).await.unwrap();
        assert!(doc.html.contains("<script src=\"file://"), "got: {}", doc.html);
        assert!(doc.html.contains("hl.js"));
    }
}

//! Full-pipeline integration tests with an in-process rendering backend.
//!
//! The fake backend reads the scratch document it is pointed at and returns
//! it wrapped in a fake PDF envelope, so every test here exercises the real
//! composition, scratch handling and destination writing without a browser.
//!
//! Run with:
//!   cargo test --test pipeline

use async_trait::async_trait;
use md2pdf::{
    compose_document, convert_to_html, convert_with_backend, BackendSession,
    ConversionConfig, ConversionProgressCallback, Md2PdfError, PrintSettings, RenderBackend,
    ResourceKind, Stage,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use url::Url;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Backend that "prints" the loaded HTML verbatim after a PDF magic line.
#[derive(Default)]
struct EchoBackend {
    fail_export: bool,
    settings: Arc<Mutex<Vec<PrintSettings>>>,
}

struct EchoSession {
    fail_export: bool,
    html: Option<String>,
    settings: Arc<Mutex<Vec<PrintSettings>>>,
}

#[async_trait]
impl RenderBackend for EchoBackend {
    async fn launch(&self) -> Result<Box<dyn BackendSession>, Md2PdfError> {
        Ok(Box::new(EchoSession {
            fail_export: self.fail_export,
            html: None,
            settings: self.settings.clone(),
        }))
    }
}

#[async_trait]
impl BackendSession for EchoSession {
    async fn open(&mut self, url: &Url) -> Result<(), Md2PdfError> {
        let path = url.to_file_path().map_err(|_| Md2PdfError::Navigation {
            url: url.to_string(),
            detail: "not a file URL".into(),
        })?;
        self.html = Some(tokio::fs::read_to_string(path).await.map_err(|e| {
            Md2PdfError::Navigation {
                url: url.to_string(),
                detail: e.to_string(),
            }
        })?);
        Ok(())
    }

    async fn export(&mut self, settings: &PrintSettings) -> Result<Vec<u8>, Md2PdfError> {
        self.settings.lock().unwrap().push(settings.clone());
        if self.fail_export {
            return Err(Md2PdfError::Export("printer on fire".into()));
        }
        let html = self.html.take().unwrap_or_default();
        Ok(format!("%PDF-fake\n{html}").into_bytes())
    }

    async fn close(self: Box<Self>) -> Result<(), Md2PdfError> {
        Ok(())
    }
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    if let Some(parent) = p.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&p, body).unwrap();
    p
}

fn rendered(path: &Path) -> String {
    let bytes = std::fs::read(path).unwrap();
    assert!(bytes.starts_with(b"%PDF"), "not a PDF: {}", path.display());
    String::from_utf8(bytes).unwrap()
}

// ── Configuration errors ─────────────────────────────────────────────────────

#[tokio::test]
async fn missing_source_fails_before_io() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConversionConfig::builder()
        .destination(dir.path().join("out.pdf"))
        .build()
        .unwrap();

    let err = convert_with_backend(&config, &EchoBackend::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Md2PdfError::MissingSource));
    assert_eq!(err.to_string(), "Source path must be provided");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn missing_destination_fails_before_io() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "doc.md", "# Title");
    let config = ConversionConfig::builder().source(&src).build().unwrap();

    let err = convert_with_backend(&config, &EchoBackend::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Md2PdfError::MissingDestination));
    assert!(err.is_config_error());
}

// ── Successful conversions ───────────────────────────────────────────────────

#[tokio::test]
async fn title_document_produces_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "doc.md", "# Title");
    let dest = dir.path().join("doc.pdf");
    let config = ConversionConfig::builder()
        .source(&src)
        .destination(&dest)
        .build()
        .unwrap();

    let out = convert_with_backend(&config, &EchoBackend::default())
        .await
        .unwrap();

    assert_eq!(out, dest);
    let pdf = rendered(&dest);
    assert!(pdf.contains("Title</h1>"));
    assert!(!dir.path().join("_md2pdf_temp.html").exists());
}

#[tokio::test]
async fn destination_derived_from_source() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "README.md", "hello");
    let config = ConversionConfig::builder()
        .source(&src)
        .destination_from_source()
        .build()
        .unwrap();

    let out = convert_with_backend(&config, &EchoBackend::default())
        .await
        .unwrap();
    assert_eq!(out, dir.path().join("README.pdf"));
    assert!(out.exists());
}

#[tokio::test]
async fn no_header_or_footer_means_no_fragment_markup() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "doc.md", "plain body");
    let backend = EchoBackend::default();
    let config = ConversionConfig::builder()
        .source(&src)
        .destination(dir.path().join("doc.pdf"))
        .build()
        .unwrap();

    let out = convert_with_backend(&config, &backend).await.unwrap();
    let pdf = rendered(&out);
    assert!(!pdf.contains("md2pdf-header"));
    assert!(!pdf.contains("md2pdf-footer"));

    let settings = backend.settings.lock().unwrap();
    assert!(!settings[0].display_header_footer);
}

#[tokio::test]
async fn header_and_footer_reach_the_backend() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "doc.md", "body");
    let header = write(dir.path(), "header.html", "<span>ACME Corp</span>");
    let footer = write(dir.path(), "footer.md", "**Confidential**");
    let backend = EchoBackend::default();
    let config = ConversionConfig::builder()
        .source(&src)
        .destination(dir.path().join("doc.pdf"))
        .header(&header)
        .footer(&footer)
        .build()
        .unwrap();

    convert_with_backend(&config, &backend).await.unwrap();

    let settings = backend.settings.lock().unwrap();
    assert!(settings[0].display_header_footer);
    assert!(settings[0].header_template.contains("ACME Corp"));
    assert!(settings[0].footer_template.contains("<strong>Confidential</strong>"));
}

#[tokio::test]
async fn debug_html_is_complete_document() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "doc.md", "# Debug me");
    let config = ConversionConfig::builder()
        .source(&src)
        .destination(dir.path().join("doc.pdf"))
        .debug_beside_destination()
        .build()
        .unwrap();

    convert_with_backend(&config, &EchoBackend::default())
        .await
        .unwrap();

    let html = std::fs::read_to_string(dir.path().join("doc.html")).unwrap();
    assert!(html.contains("<html>"));
    let style_start = html.find("<style>").unwrap() + "<style>".len();
    let style_end = html.find("</style>").unwrap();
    assert!(!html[style_start..style_end].trim().is_empty());
    assert!(!dir.path().join("_md2pdf_temp.html").exists());
}

#[tokio::test]
async fn images_resolve_against_source_not_destination() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "docs/guide.md", "![diagram](img/flow.png)");
    let dest = dir.path().join("build/pdf/guide.pdf");
    let config = ConversionConfig::builder()
        .source(&src)
        .destination(&dest)
        .build()
        .unwrap();

    convert_with_backend(&config, &EchoBackend::default())
        .await
        .unwrap();

    let pdf = rendered(&dest);
    let expected = Url::from_file_path(dir.path().join("docs/img/flow.png")).unwrap();
    assert!(
        pdf.contains(&format!("src=\"{expected}\"")),
        "got: {pdf}"
    );
}

#[tokio::test]
async fn styles_follow_cascade_order() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "doc.md", "x");
    let css = write(dir.path(), "brand.css", "/* brand-overrides */");
    let config = ConversionConfig::builder()
        .source(&src)
        .destination(dir.path().join("doc.pdf"))
        .styles(&css)
        .build()
        .unwrap();

    let doc = compose_document(&config).await.unwrap();
    assert_eq!(doc.stylesheets.len(), 4);
    assert_eq!(doc.stylesheets[0], "github-markdown.css");
    assert_eq!(doc.stylesheets[1], "highlight.css");
    assert_eq!(doc.stylesheets[2], "default.css");
    assert!(doc.stylesheets[3].ends_with("brand.css"));
}

#[tokio::test]
async fn no_emoji_keeps_colon_text_literal() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "doc.md", "Meeting at 10:00:00, mood :smile:");

    let plain = ConversionConfig::builder()
        .source(&src)
        .destination(dir.path().join("doc.pdf"))
        .no_emoji(true)
        .build()
        .unwrap();
    let doc = compose_document(&plain).await.unwrap();
    assert!(doc.html.contains("10:00:00"));
    assert!(doc.html.contains(":smile:"));

    let emoji = ConversionConfig::builder()
        .source(&src)
        .destination(dir.path().join("doc.pdf"))
        .build()
        .unwrap();
    let doc = compose_document(&emoji).await.unwrap();
    assert!(doc.html.contains("10:00:00"));
    assert!(!doc.html.contains(":smile:"));
}

#[tokio::test]
async fn concurrent_conversions_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let a_src = write(dir.path(), "a/doc.md", "# Alpha :smile:");
    let b_src = write(dir.path(), "b/doc.md", "# Beta :smile:");

    let a = ConversionConfig::builder()
        .source(&a_src)
        .destination(dir.path().join("a/doc.pdf"))
        .build()
        .unwrap();
    let b = ConversionConfig::builder()
        .source(&b_src)
        .destination(dir.path().join("b/doc.pdf"))
        .no_emoji(true)
        .build()
        .unwrap();

    let backend_a = EchoBackend::default();
    let backend_b = EchoBackend::default();
    let (ra, rb) = tokio::join!(
        convert_with_backend(&a, &backend_a),
        convert_with_backend(&b, &backend_b)
    );

    let pdf_a = rendered(&ra.unwrap());
    let pdf_b = rendered(&rb.unwrap());
    assert!(pdf_a.contains("Alpha") && !pdf_a.contains("Beta"));
    assert!(pdf_b.contains("Beta") && !pdf_b.contains("Alpha"));
    assert!(!pdf_a.contains(":smile:"));
    assert!(pdf_b.contains(":smile:"));
}

#[tokio::test]
async fn html_only_writes_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "doc.md", "# Preview");
    let dest = dir.path().join("preview/doc.html");
    let config = ConversionConfig::builder()
        .source(&src)
        .destination(&dest)
        .build()
        .unwrap();

    let out = convert_to_html(&config).await.unwrap();
    assert_eq!(out, dest);
    let html = std::fs::read_to_string(&dest).unwrap();
    assert!(html.contains("Preview</h1>"));
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_render_cleans_scratch_and_leaves_no_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "doc.md", "# Title");
    let dest = dir.path().join("doc.pdf");
    let config = ConversionConfig::builder()
        .source(&src)
        .destination(&dest)
        .build()
        .unwrap();
    let backend = EchoBackend {
        fail_export: true,
        ..EchoBackend::default()
    };

    let err = convert_with_backend(&config, &backend).await.unwrap_err();
    assert!(matches!(err, Md2PdfError::Export(_)));
    assert!(!dest.exists());
    assert!(!dir.path().join("_md2pdf_temp.html").exists());
}

#[tokio::test]
async fn failed_render_with_debug_keeps_html() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "doc.md", "# Title");
    let dest = dir.path().join("doc.pdf");
    let config = ConversionConfig::builder()
        .source(&src)
        .destination(&dest)
        .debug(dir.path().join("debug.html"))
        .build()
        .unwrap();
    let backend = EchoBackend {
        fail_export: true,
        ..EchoBackend::default()
    };

    convert_with_backend(&config, &backend).await.unwrap_err();
    assert!(!dest.exists());
    assert!(dir.path().join("debug.html").exists());
    assert!(!dir.path().join("_md2pdf_temp.html").exists());
}

#[tokio::test]
async fn missing_footer_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "doc.md", "# Title");
    let dest = dir.path().join("doc.pdf");
    let config = ConversionConfig::builder()
        .source(&src)
        .destination(&dest)
        .footer(dir.path().join("no-such-footer.html"))
        .build()
        .unwrap();

    let err = convert_with_backend(&config, &EchoBackend::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Md2PdfError::ResourceRead {
            kind: ResourceKind::Footer,
            ..
        }
    ));
    assert!(!dest.exists());
    assert!(!dir.path().join("_md2pdf_temp.html").exists());
}

// ── Progress events ──────────────────────────────────────────────────────────

#[derive(Default)]
struct StageLog {
    started: Mutex<Vec<Stage>>,
    finished: Mutex<Option<PathBuf>>,
}

impl ConversionProgressCallback for StageLog {
    fn on_stage_start(&self, stage: Stage) {
        self.started.lock().unwrap().push(stage);
    }

    fn on_conversion_complete(&self, destination: &Path) {
        *self.finished.lock().unwrap() = Some(destination.to_path_buf());
    }
}

#[tokio::test]
async fn progress_reports_every_stage_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "doc.md", "# Title");
    let log = Arc::new(StageLog::default());
    let config = ConversionConfig::builder()
        .source(&src)
        .destination(dir.path().join("doc.pdf"))
        .progress_callback(log.clone())
        .build()
        .unwrap();

    let out = convert_with_backend(&config, &EchoBackend::default())
        .await
        .unwrap();

    assert_eq!(
        *log.started.lock().unwrap(),
        vec![
            Stage::Styles,
            Stage::Header,
            Stage::Footer,
            Stage::Body,
            Stage::Layout,
            Stage::Render
        ]
    );
    assert_eq!(*log.finished.lock().unwrap(), Some(out));
}

//! Layout templates: the document body, running header and footer.
//!
//! Each template is compiled on its own, when the stage that needs it runs,
//! and rendered with a fixed set of variables:
//!
//! | Template       | Variables                                      |
//! |----------------|------------------------------------------------|
//! | `doc-body`     | `body`, `css`, `header`, `footer`, `highlight_js` |
//! | `header`       | `content`, `css`                               |
//! | `footer`       | `content`                                      |
//!
//! The defaults are compiled into the binary. A caller may point at a
//! structurally-compatible Tera template instead; it receives exactly the
//! same variables.

use crate::error::{Md2PdfError, ResourceKind};
use std::path::Path;
use tera::{Context, Tera};
use tracing::debug;

const DOCUMENT_LAYOUT: &str = include_str!("../../assets/layouts/doc-body.html");
const HEADER_LAYOUT: &str = include_str!("../../assets/layouts/header.html");
const FOOTER_LAYOUT: &str = include_str!("../../assets/layouts/footer.html");

/// Which of the three layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Document,
    Header,
    Footer,
}

impl LayoutKind {
    /// Template name; the `.html` suffix turns on Tera's autoescaping for
    /// every variable not marked `| safe`.
    pub fn name(self) -> &'static str {
        match self {
            LayoutKind::Document => "doc-body.html",
            LayoutKind::Header => "header.html",
            LayoutKind::Footer => "footer.html",
        }
    }

    fn builtin(self) -> &'static str {
        match self {
            LayoutKind::Document => DOCUMENT_LAYOUT,
            LayoutKind::Header => HEADER_LAYOUT,
            LayoutKind::Footer => FOOTER_LAYOUT,
        }
    }
}

/// A compiled layout template.
pub struct Layout {
    kind: LayoutKind,
    tera: Tera,
}

impl Layout {
    /// Compile the layout for `kind`, reading `override_path` when given.
    pub async fn load(kind: LayoutKind, override_path: Option<&Path>) -> Result<Self, Md2PdfError> {
        let source = match override_path {
            Some(path) => {
                debug!("Loading {} layout from {}", kind.name(), path.display());
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(Md2PdfError::read(ResourceKind::Layout, path))?
            }
            None => kind.builtin().to_string(),
        };
        Self::compile(kind, &source)
    }

    /// Compile `source` as the layout for `kind`.
    pub fn compile(kind: LayoutKind, source: &str) -> Result<Self, Md2PdfError> {
        let mut tera = Tera::default();
        tera.add_raw_template(kind.name(), source)
            .map_err(|e| Md2PdfError::template(kind.name(), e))?;
        Ok(Self { kind, tera })
    }

    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Render the document layout.
    pub fn render_document(&self, vars: &DocumentVars<'_>) -> Result<String, Md2PdfError> {
        let mut ctx = Context::new();
        ctx.insert("body", vars.body);
        ctx.insert("css", vars.css);
        ctx.insert("header", &vars.header);
        ctx.insert("footer", &vars.footer);
        ctx.insert("highlight_js", &vars.highlight_js);
        self.render(&ctx)
    }

    /// Render the header layout. `css` must already be quote-safe.
    pub fn render_header(&self, content: &str, css: &str) -> Result<String, Md2PdfError> {
        let mut ctx = Context::new();
        ctx.insert("content", content);
        ctx.insert("css", css);
        self.render(&ctx)
    }

    /// Render the footer layout.
    pub fn render_footer(&self, content: &str) -> Result<String, Md2PdfError> {
        let mut ctx = Context::new();
        ctx.insert("content", content);
        self.render(&ctx)
    }

    fn render(&self, ctx: &Context) -> Result<String, Md2PdfError> {
        self.tera
            .render(self.kind.name(), ctx)
            .map_err(|e| Md2PdfError::template(self.kind.name(), e))
    }
}

/// Variables of the document layout.
#[derive(Debug, Clone, Default)]
pub struct DocumentVars<'a> {
    /// Qualified body HTML.
    pub body: &'a str,
    /// Full `<style>` block.
    pub css: &'a str,
    /// Rendered header, `None` when absent.
    pub header: Option<&'a str>,
    /// Rendered footer, `None` when absent.
    pub footer: Option<&'a str>,
    /// `file://` URL of a highlighter script.
    pub highlight_js: Option<String>,
}

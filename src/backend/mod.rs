//! Rendering backends: whatever turns an HTML file into PDF bytes.
//!
//! The dispatcher only talks to the two traits below. A backend is launched
//! once per conversion, opens exactly one page, exports it and is closed
//! again, so sessions never outlive a single [`crate::convert`] call.
//!
//! ```text
//! RenderBackend::launch ──▶ BackendSession::open ──▶ export ──▶ close
//!      (process)               (navigate + wait)    (bytes)
//! ```
//!
//! [`ChromiumBackend`] is the production implementation. Tests and embedding
//! applications can supply their own.

#[cfg(feature = "chromium")]
pub mod chromium;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumBackend;

use crate::config::PdfOptions;
use crate::error::Md2PdfError;
use crate::pipeline::fragments::Fragment;
use async_trait::async_trait;
use url::Url;

/// Starts rendering sessions.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Start a fresh, isolated session.
    async fn launch(&self) -> Result<Box<dyn BackendSession>, Md2PdfError>;
}

/// One running backend instance with a single page.
#[async_trait]
pub trait BackendSession: Send {
    /// Load `url` and wait until the page has finished loading.
    async fn open(&mut self, url: &Url) -> Result<(), Md2PdfError>;

    /// Paginate the loaded page and return the PDF bytes.
    async fn export(&mut self, settings: &PrintSettings) -> Result<Vec<u8>, Md2PdfError>;

    /// Shut the session down. Called on success and on failure.
    async fn close(self: Box<Self>) -> Result<(), Md2PdfError>;
}

/// Print parameters in the units a browser print API expects.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintSettings {
    /// Portrait paper width in inches.
    pub paper_width: f64,
    /// Portrait paper height in inches.
    pub paper_height: f64,
    pub landscape: bool,
    /// `[top, right, bottom, left]` in inches.
    pub margins: [f64; 4],
    pub print_background: bool,
    pub scale: f64,
    pub display_header_footer: bool,
    pub header_template: String,
    pub footer_template: String,
}

/// Stands in for an absent header or footer. An empty template would make
/// Chromium print its own date/title/URL line instead.
const EMPTY_TEMPLATE: &str = "<span></span>";

impl PrintSettings {
    pub fn new(
        options: &PdfOptions,
        header: &Fragment,
        footer: &Fragment,
    ) -> Result<Self, Md2PdfError> {
        let (paper_width, paper_height) = options.format.size_inches();
        let display_header_footer = options
            .display_header_footer
            .unwrap_or(header.is_present() || footer.is_present());

        Ok(Self {
            paper_width,
            paper_height,
            landscape: options.landscape,
            margins: options.margin.to_inches()?,
            print_background: options.print_background,
            scale: options.scale,
            display_header_footer,
            header_template: header.as_deref().unwrap_or(EMPTY_TEMPLATE).to_string(),
            footer_template: footer.as_deref().unwrap_or(EMPTY_TEMPLATE).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Margins, PageFormat};

    #[test]
    fn header_footer_shown_only_when_present() {
        let opts = PdfOptions::default();
        let none = PrintSettings::new(&opts, &Fragment::Absent, &Fragment::Absent).unwrap();
        assert!(!none.display_header_footer);
        assert_eq!(none.header_template, EMPTY_TEMPLATE);

        let footer = Fragment::Present("<div>p</div>".into());
        let some = PrintSettings::new(&opts, &Fragment::Absent, &footer).unwrap();
        assert!(some.display_header_footer);
        assert_eq!(some.footer_template, "<div>p</div>");
        assert_eq!(some.header_template, EMPTY_TEMPLATE);
    }

    #[test]
    fn explicit_display_flag_wins() {
        let opts = PdfOptions {
            display_header_footer: Some(false),
            ..PdfOptions::default()
        };
        let header = Fragment::Present("h".into());
        let s = PrintSettings::new(&opts, &header, &Fragment::Absent).unwrap();
        assert!(!s.display_header_footer);
    }

    #[test]
    fn paper_and_margins_in_inches() {
        let opts = PdfOptions {
            format: PageFormat::Letter,
            landscape: true,
            margin: Margins::uniform("1in"),
            ..PdfOptions::default()
        };
        let s = PrintSettings::new(&opts, &Fragment::Absent, &Fragment::Absent).unwrap();
        assert_eq!((s.paper_width, s.paper_height), (8.5, 11.0));
        assert!(s.landscape);
        assert_eq!(s.margins, [1.0; 4]);
    }
}

//! # md2pdf
//!
//! Convert Markdown documents into paginated PDF through headless Chromium.
//!
//! ## Why a browser?
//!
//! Good print typography for Markdown is mostly CSS: GitHub-style tables,
//! code blocks, page margins, running headers and footers. A browser already
//! implements all of it, so this crate assembles one self-contained HTML
//! document and asks Chromium to paginate it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Styles    GitHub base → highlight → default → user stylesheet
//!  ├─ 2. Fragments running header / footer, qualified and templated
//!  ├─ 3. Body      comrak (GitHub preset, emoji shortcodes)
//!  ├─ 4. Qualify   relative <img src> → absolute, against the source dir
//!  ├─ 5. Layout    Tera document template
//!  └─ 6. Render    scratch HTML → Chromium → PDF (atomic write)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2pdf::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .source("README.md")
//!         .destination("README.pdf")
//!         .footer("footer.html")
//!         .build()?;
//!     let pdf = convert(&config).await?;
//!     println!("{}", pdf.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature    | Default | Description |
//! |------------|---------|-------------|
//! | `chromium` | on      | [`ChromiumBackend`] and [`convert`] (chromiumoxide) |
//! | `cli`      | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber) |
//!
//! With both disabled the library still composes documents, and
//! [`convert_with_backend`] renders through any [`RenderBackend`]:
//! ```toml
//! md2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

#[cfg(feature = "chromium")]
pub use backend::ChromiumBackend;
pub use backend::{BackendSession, PrintSettings, RenderBackend};
pub use config::{ConversionConfig, ConversionConfigBuilder, Margins, PageFormat, PdfOptions};
#[cfg(feature = "chromium")]
pub use convert::{convert, convert_sync};
pub use convert::{compose_document, convert_to_html, convert_with_backend};
pub use error::{Md2PdfError, ResourceKind};
pub use pipeline::compose::AssembledDocument;
pub use pipeline::fragments::Fragment;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};

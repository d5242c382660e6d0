//! Stylesheet selection and loading.
//!
//! [`StyleBundle::from_config`] decides *which* sheets apply and in what
//! order; it does no I/O. [`StyleBundle::load`] reads them later, when the
//! document is actually being assembled, so a missing user stylesheet
//! surfaces as a read error at that point.
//!
//! Order matters: later sheets win under the normal CSS cascade, so the
//! caller's stylesheet is always last.
//!
//! ```text
//! github-markdown.css   (gh_style)
//! highlight.css         (always)
//! default.css           (default_style)
//! <user styles>         (styles = Some(path))
//! ```

use crate::config::ConversionRequest;
use crate::error::{Md2PdfError, ResourceKind};
use std::path::PathBuf;
use tracing::debug;

const GITHUB_CSS: &str = include_str!("../../assets/css/github-markdown.css");
const HIGHLIGHT_CSS: &str = include_str!("../../assets/css/highlight.css");
const DEFAULT_CSS: &str = include_str!("../../assets/css/default.css");

/// One stylesheet in the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleSource {
    /// A sheet compiled into the binary.
    Builtin { name: &'static str, css: &'static str },
    /// A sheet read from disk when the bundle is loaded.
    File(PathBuf),
}

impl StyleSource {
    /// Display name: the built-in file name or the user path.
    pub fn label(&self) -> String {
        match self {
            StyleSource::Builtin { name, .. } => (*name).to_string(),
            StyleSource::File(path) => path.display().to_string(),
        }
    }
}

/// Ordered stylesheet selection for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleBundle {
    sources: Vec<StyleSource>,
}

impl StyleBundle {
    /// Select the stylesheets for `request`. Pure; reads nothing.
    pub fn from_config(request: &ConversionRequest) -> Self {
        let mut sources = Vec::with_capacity(4);

        if request.gh_style {
            sources.push(StyleSource::Builtin {
                name: "github-markdown.css",
                css: GITHUB_CSS,
            });
        }

        sources.push(StyleSource::Builtin {
            name: "highlight.css",
            css: HIGHLIGHT_CSS,
        });

        if request.default_style {
            sources.push(StyleSource::Builtin {
                name: "default.css",
                css: DEFAULT_CSS,
            });
        }

        if let Some(ref path) = request.styles {
            sources.push(StyleSource::File(path.clone()));
        }

        Self { sources }
    }

    pub fn sources(&self) -> &[StyleSource] {
        &self.sources
    }

    /// Labels of the selected sheets, in cascade order.
    pub fn stylesheets(&self) -> Vec<String> {
        self.sources.iter().map(StyleSource::label).collect()
    }

    /// Read every sheet and concatenate them in order.
    pub async fn load(&self) -> Result<LoadedStyles, Md2PdfError> {
        let mut css = String::new();
        for source in &self.sources {
            let text = match source {
                StyleSource::Builtin { css, .. } => (*css).to_string(),
                StyleSource::File(path) => tokio::fs::read_to_string(path)
                    .await
                    .map_err(Md2PdfError::read(ResourceKind::Stylesheet, path))?,
            };
            debug!("Loaded stylesheet {} ({} bytes)", source.label(), text.len());
            if !css.is_empty() && !css.ends_with('\n') {
                css.push('\n');
            }
            css.push_str(&text);
        }
        Ok(LoadedStyles { css })
    }
}

/// The concatenated CSS of a [`StyleBundle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedStyles {
    css: String,
}

impl LoadedStyles {
    /// Raw concatenated CSS.
    pub fn css(&self) -> &str {
        &self.css
    }

    /// The CSS wrapped in a single `<style>` element.
    pub fn style_block(&self) -> String {
        format!("<style>\n{}\n</style>", self.css)
    }
}

//! Configuration types for Markdown-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The config is what the caller hands
//! in; [`ConversionRequest`] is its validated form, produced once at the
//! start of every conversion. Validation never touches the filesystem, so a
//! missing `source` or `destination` fails before any I/O happens.

use crate::error::Md2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration for a Markdown-to-PDF conversion.
///
/// # Example
/// ```rust
/// use md2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .source("README.md")
///     .destination_from_source()
///     .no_emoji(true)
///     .build()
///     .unwrap();
/// assert!(config.gh_style);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Markdown document to convert. Required.
    pub source: Option<PathBuf>,

    /// Where the PDF is written. Required unless `derive_destination` is set.
    pub destination: Option<PathBuf>,

    /// Derive a missing destination as `<source stem>.pdf` beside the source.
    pub derive_destination: bool,

    /// Running header fragment (markdown or HTML).
    pub header: Option<PathBuf>,

    /// Running footer fragment (markdown or HTML).
    pub footer: Option<PathBuf>,

    /// Caller stylesheet, applied last so it overrides every built-in sheet.
    pub styles: Option<PathBuf>,

    /// Include the GitHub markdown stylesheet. Default: true.
    pub gh_style: bool,

    /// Include the default spacing stylesheet. Default: true.
    pub default_style: bool,

    /// Disable `:shortcode:` emoji substitution. Default: false.
    ///
    /// Substitution stays on by default even though it can rewrite literal
    /// colon-delimited text that happens to spell an emoji name.
    pub no_emoji: bool,

    /// Keep the intermediate HTML at this path instead of deleting it.
    pub debug: Option<PathBuf>,

    /// Keep the intermediate HTML as `<destination stem>.html` when no
    /// explicit `debug` path is given.
    pub derive_debug: bool,

    /// Pagination options forwarded to the rendering backend.
    pub pdf: PdfOptions,

    /// Replacement layout templates.
    pub layouts: LayoutPaths,

    /// Client-side highlighter script referenced by the document layout.
    pub highlight_js: Option<PathBuf>,

    /// Optional per-stage progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            derive_destination: false,
            header: None,
            footer: None,
            styles: None,
            gh_style: true,
            default_style: true,
            no_emoji: false,
            debug: None,
            derive_debug: false,
            pdf: PdfOptions::default(),
            layouts: LayoutPaths::default(),
            highlight_js: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("derive_destination", &self.derive_destination)
            .field("header", &self.header)
            .field("footer", &self.footer)
            .field("styles", &self.styles)
            .field("gh_style", &self.gh_style)
            .field("default_style", &self.default_style)
            .field("no_emoji", &self.no_emoji)
            .field("debug", &self.debug)
            .field("derive_debug", &self.derive_debug)
            .field("pdf", &self.pdf)
            .field("layouts", &self.layouts)
            .field("highlight_js", &self.highlight_js)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.source = Some(path.into());
        self
    }

    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.destination = Some(path.into());
        self
    }

    /// Use `<source stem>.pdf` when no destination is given.
    pub fn destination_from_source(mut self) -> Self {
        self.config.derive_destination = true;
        self
    }

    pub fn header(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.header = Some(path.into());
        self
    }

    pub fn footer(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.footer = Some(path.into());
        self
    }

    pub fn styles(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.styles = Some(path.into());
        self
    }

    pub fn gh_style(mut self, v: bool) -> Self {
        self.config.gh_style = v;
        self
    }

    pub fn default_style(mut self, v: bool) -> Self {
        self.config.default_style = v;
        self
    }

    pub fn no_emoji(mut self, v: bool) -> Self {
        self.config.no_emoji = v;
        self
    }

    pub fn debug(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.debug = Some(path.into());
        self
    }

    /// Keep the intermediate HTML beside the destination.
    pub fn debug_beside_destination(mut self) -> Self {
        self.config.derive_debug = true;
        self
    }

    pub fn pdf(mut self, options: PdfOptions) -> Self {
        self.config.pdf = options;
        self
    }

    pub fn format(mut self, format: PageFormat) -> Self {
        self.config.pdf.format = format;
        self
    }

    pub fn landscape(mut self, v: bool) -> Self {
        self.config.pdf.landscape = v;
        self
    }

    pub fn margin(mut self, margin: Margins) -> Self {
        self.config.pdf.margin = margin;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.config.pdf.scale = scale.clamp(0.1, 2.0);
        self
    }

    pub fn layout(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.layouts.document = Some(path.into());
        self
    }

    pub fn header_layout(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.layouts.header = Some(path.into());
        self
    }

    pub fn footer_layout(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.layouts.footer = Some(path.into());
        self
    }

    pub fn highlight_js(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.highlight_js = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating option values.
    ///
    /// A missing `source`/`destination` is *not* rejected here: the
    /// pipeline reports it as a configuration error when a conversion
    /// starts, so a config can be built up incrementally.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        self.config.pdf.validate()?;
        Ok(self.config)
    }
}

/// Replacement layout templates. `None` uses the embedded default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutPaths {
    pub document: Option<PathBuf>,
    pub header: Option<PathBuf>,
    pub footer: Option<PathBuf>,
}

// ── Validated request ────────────────────────────────────────────────────

/// A validated conversion request.
///
/// `asset_dir` is the directory of the absolute source path. It is resolved
/// here, once, before any fragment is qualified: header, footer and body
/// reference images relative to the source document, not to the process's
/// working directory.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub asset_dir: PathBuf,
    pub header: Option<PathBuf>,
    pub footer: Option<PathBuf>,
    pub styles: Option<PathBuf>,
    pub gh_style: bool,
    pub default_style: bool,
    pub emoji: bool,
    pub debug: Option<PathBuf>,
    pub pdf: PdfOptions,
    pub layouts: LayoutPaths,
    pub highlight_js: Option<PathBuf>,
}

impl ConversionRequest {
    /// Validate `config` without touching the filesystem.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Md2PdfError> {
        let source = config
            .source
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(Md2PdfError::MissingSource)?;

        let destination = match config.destination.clone().filter(|p| !p.as_os_str().is_empty()) {
            Some(dest) => dest,
            None if config.derive_destination => default_destination(&source),
            None => return Err(Md2PdfError::MissingDestination),
        };

        config.pdf.validate()?;

        let debug = match non_empty(&config.debug) {
            Some(path) => Some(path),
            None if config.derive_debug => Some(destination.with_extension("html")),
            None => None,
        };

        Ok(Self {
            asset_dir: asset_dir_for(&source)?,
            source,
            destination,
            header: non_empty(&config.header),
            footer: non_empty(&config.footer),
            styles: non_empty(&config.styles),
            gh_style: config.gh_style,
            default_style: config.default_style,
            emoji: !config.no_emoji,
            debug,
            pdf: config.pdf.clone(),
            layouts: config.layouts.clone(),
            highlight_js: non_empty(&config.highlight_js),
        })
    }

    /// The scratch HTML file the backend loads, beside the destination.
    pub fn scratch_path(&self) -> PathBuf {
        self.destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .join(SCRATCH_FILE_NAME)
    }
}

/// File name of the scratch document, one per destination directory.
pub const SCRATCH_FILE_NAME: &str = "_md2pdf_temp.html";

/// `<source stem>.pdf` beside the source.
pub fn default_destination(source: &Path) -> PathBuf {
    source.with_extension("pdf")
}

fn non_empty(path: &Option<PathBuf>) -> Option<PathBuf> {
    path.clone().filter(|p| !p.as_os_str().is_empty())
}

fn asset_dir_for(source: &Path) -> Result<PathBuf, Md2PdfError> {
    let absolute = std::path::absolute(source).map_err(|e| {
        Md2PdfError::InvalidConfig(format!(
            "cannot resolve source path '{}': {e}",
            source.display()
        ))
    })?;
    Ok(absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/")))
}

// ── PDF options ──────────────────────────────────────────────────────────

/// Pagination options forwarded to the rendering backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PdfOptions {
    /// Paper size. Default: A4.
    pub format: PageFormat,

    /// Rotate the paper. Default: false.
    pub landscape: bool,

    /// Page margins as CSS lengths. Default: 20mm on every side.
    pub margin: Margins,

    /// Print background colours and images. Default: true.
    ///
    /// The GitHub stylesheet shades code blocks and table rows; without
    /// backgrounds they print as plain text.
    pub print_background: bool,

    /// Rendering scale, 0.1–2.0. Default: 1.0.
    pub scale: f64,

    /// Print the running header/footer. Default: on iff one is configured.
    pub display_header_footer: Option<bool>,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            format: PageFormat::default(),
            landscape: false,
            margin: Margins::default(),
            print_background: true,
            scale: 1.0,
            display_header_footer: None,
        }
    }
}

impl PdfOptions {
    /// Check that every margin parses and the scale is in range.
    pub fn validate(&self) -> Result<(), Md2PdfError> {
        self.margin.to_inches()?;
        if !(0.1..=2.0).contains(&self.scale) {
            return Err(Md2PdfError::InvalidConfig(format!(
                "scale must be 0.1–2.0, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

/// Named paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PageFormat {
    Letter,
    Legal,
    Tabloid,
    A3,
    #[default]
    A4,
    A5,
}

impl PageFormat {
    /// Width and height in inches (portrait).
    pub fn size_inches(self) -> (f64, f64) {
        match self {
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::Legal => (8.5, 14.0),
            PageFormat::Tabloid => (11.0, 17.0),
            PageFormat::A3 => (11.7, 16.54),
            PageFormat::A4 => (8.27, 11.7),
            PageFormat::A5 => (5.83, 8.27),
        }
    }
}

impl FromStr for PageFormat {
    type Err = Md2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "letter" => Ok(PageFormat::Letter),
            "legal" => Ok(PageFormat::Legal),
            "tabloid" => Ok(PageFormat::Tabloid),
            "a3" => Ok(PageFormat::A3),
            "a4" => Ok(PageFormat::A4),
            "a5" => Ok(PageFormat::A5),
            other => Err(Md2PdfError::InvalidConfig(format!(
                "unknown page format '{other}' (expected letter, legal, tabloid, a3, a4, a5)"
            ))),
        }
    }
}

impl TryFrom<String> for PageFormat {
    type Error = Md2PdfError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PageFormat> for String {
    fn from(value: PageFormat) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageFormat::Letter => "Letter",
            PageFormat::Legal => "Legal",
            PageFormat::Tabloid => "Tabloid",
            PageFormat::A3 => "A3",
            PageFormat::A4 => "A4",
            PageFormat::A5 => "A5",
        };
        f.write_str(name)
    }
}

/// Page margins as CSS lengths (`20mm`, `1.5cm`, `0.5in`, `40px`, `40`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform("20mm")
    }
}

impl Margins {
    /// The same margin on every side.
    pub fn uniform(length: impl Into<String>) -> Self {
        let length = length.into();
        Self {
            top: length.clone(),
            right: length.clone(),
            bottom: length.clone(),
            left: length,
        }
    }

    /// `[top, right, bottom, left]` in inches.
    pub fn to_inches(&self) -> Result<[f64; 4], Md2PdfError> {
        Ok([
            length_to_inches(&self.top)?,
            length_to_inches(&self.right)?,
            length_to_inches(&self.bottom)?,
            length_to_inches(&self.left)?,
        ])
    }
}

/// Convert a CSS length to inches. A bare number is read as pixels
/// (96 px per inch).
pub fn length_to_inches(length: &str) -> Result<f64, Md2PdfError> {
    let s = length.trim().to_ascii_lowercase();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| Md2PdfError::InvalidConfig(format!("invalid margin length '{length}'")))?;

    let inches = match unit.trim() {
        "" | "px" => value / 96.0,
        "in" => value,
        "cm" => value / 2.54,
        "mm" => value / 25.4,
        other => {
            return Err(Md2PdfError::InvalidConfig(format!(
                "unsupported margin unit '{other}' in '{length}' (use mm, cm, in or px)"
            )))
        }
    };
    Ok(inches)
}

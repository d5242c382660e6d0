//! CLI binary for md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints the destination path.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use md2pdf::{
    convert_to_html, convert_with_backend, ChromiumBackend, ConversionConfig,
    ConversionProgressCallback, Margins, PageFormat, PdfOptions, ProgressCallback, Stage,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner naming the running stage, and one
/// log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("md2pdf");
        bar.set_message("Starting…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    /// Clear the spinner after a failed conversion.
    fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<22} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{elapsed_ms}ms")),
        ));
    }

    fn on_conversion_complete(&self, destination: &Path) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Wrote {}",
            green("✔"),
            bold(&destination.display().to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # README.md → README.pdf
  md2pdf README.md

  # Explicit destination, running footer, custom stylesheet
  md2pdf guide.md out/guide.pdf --footer footer.html --styles print.css

  # US Letter, landscape, wider margins
  md2pdf --format letter --landscape --margin 1in report.md

  # Keep the intermediate HTML for inspection
  md2pdf --debug report.md            # writes report.html beside report.pdf

  # Just the assembled HTML, no browser
  md2pdf --html-only report.md report.html

PDF OPTIONS FILE (--pdf-options):
  {
    "format": "A4",
    "landscape": false,
    "margin": { "top": "25mm", "bottom": "25mm" },
    "printBackground": true,
    "scale": 1.0,
    "displayHeaderFooter": true
  }
  Flags given on the command line override values from the file.

LAYOUTS:
  --layout         Tera template; variables: body, css, header, footer, highlight_js
  --header-layout  Tera template; variables: content, css
  --footer-layout  Tera template; variables: content

ENVIRONMENT VARIABLES:
  CHROME          Chrome/Chromium executable (same as --chrome)
  RUST_LOG        Log filter, overrides -v / -q
  MD2PDF_*        Fallback for every flag, e.g. MD2PDF_FOOTER=footer.html
"#;

/// Convert Markdown documents to PDF through headless Chromium.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert Markdown documents to PDF through headless Chromium",
    long_about = "Convert a Markdown document to a paginated PDF. The document is styled with \
GitHub-flavoured CSS (plus an optional stylesheet of your own), given optional running headers \
and footers, and printed by a headless Chrome or Chromium.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to convert.
    #[arg(env = "MD2PDF_SOURCE")]
    source: PathBuf,

    /// PDF to write. Default: the source path with a `.pdf` extension.
    #[arg(env = "MD2PDF_DESTINATION")]
    destination: Option<PathBuf>,

    /// Running header fragment (HTML or Markdown).
    #[arg(long, env = "MD2PDF_HEADER")]
    header: Option<PathBuf>,

    /// Running footer fragment (HTML or Markdown).
    #[arg(long, env = "MD2PDF_FOOTER")]
    footer: Option<PathBuf>,

    /// Extra stylesheet, applied after the built-in ones.
    #[arg(long, env = "MD2PDF_STYLES")]
    styles: Option<PathBuf>,

    /// Leave out the GitHub markdown stylesheet.
    #[arg(long, env = "MD2PDF_NO_GH_STYLE")]
    no_gh_style: bool,

    /// Leave out the default print spacing stylesheet.
    #[arg(long, env = "MD2PDF_NO_DEFAULT_STYLE")]
    no_default_style: bool,

    /// Do not turn `:shortcode:` sequences into emoji.
    #[arg(long, env = "MD2PDF_NO_EMOJI")]
    no_emoji: bool,

    /// Keep the intermediate HTML beside the destination.
    #[arg(long, env = "MD2PDF_DEBUG")]
    debug: bool,

    /// Keep the intermediate HTML at this path.
    #[arg(long, env = "MD2PDF_DEBUG_PATH")]
    debug_path: Option<PathBuf>,

    /// Paper size: A3, A4, A5, Letter, Legal, Tabloid.
    #[arg(long, env = "MD2PDF_FORMAT")]
    format: Option<PageFormat>,

    /// Landscape orientation.
    #[arg(long, env = "MD2PDF_LANDSCAPE")]
    landscape: bool,

    /// Margin on every side (e.g. 20mm, 1in, 2cm, 48px).
    #[arg(long, env = "MD2PDF_MARGIN")]
    margin: Option<String>,

    /// Top margin; overrides --margin.
    #[arg(long, env = "MD2PDF_MARGIN_TOP")]
    margin_top: Option<String>,

    /// Right margin; overrides --margin.
    #[arg(long, env = "MD2PDF_MARGIN_RIGHT")]
    margin_right: Option<String>,

    /// Bottom margin; overrides --margin.
    #[arg(long, env = "MD2PDF_MARGIN_BOTTOM")]
    margin_bottom: Option<String>,

    /// Left margin; overrides --margin.
    #[arg(long, env = "MD2PDF_MARGIN_LEFT")]
    margin_left: Option<String>,

    /// Do not print background colours and images.
    #[arg(long, env = "MD2PDF_NO_BACKGROUND")]
    no_background: bool,

    /// Rendering scale (0.1–2.0).
    #[arg(long, env = "MD2PDF_SCALE")]
    scale: Option<f64>,

    /// JSON file with PDF options (see below).
    #[arg(long, env = "MD2PDF_PDF_OPTIONS")]
    pdf_options: Option<PathBuf>,

    /// Replacement document layout template.
    #[arg(long, env = "MD2PDF_LAYOUT")]
    layout: Option<PathBuf>,

    /// Replacement header layout template.
    #[arg(long, env = "MD2PDF_HEADER_LAYOUT")]
    header_layout: Option<PathBuf>,

    /// Replacement footer layout template.
    #[arg(long, env = "MD2PDF_FOOTER_LAYOUT")]
    footer_layout: Option<PathBuf>,

    /// Client-side syntax highlighter script (e.g. highlight.min.js).
    #[arg(long, env = "MD2PDF_HIGHLIGHT_JS")]
    highlight_js: Option<PathBuf>,

    /// Chrome/Chromium executable. Default: $CHROME, then auto-detect.
    #[arg(long, env = "MD2PDF_CHROME")]
    chrome: Option<PathBuf>,

    /// Run Chromium without its sandbox (needed as root in containers).
    #[arg(long, env = "MD2PDF_NO_SANDBOX")]
    no_sandbox: bool,

    /// Page load timeout in seconds.
    #[arg(long, env = "MD2PDF_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Write the assembled HTML to the destination instead of a PDF.
    #[arg(long, env = "MD2PDF_HTML_ONLY")]
    html_only: bool,

    /// Disable progress spinner.
    #[arg(long, env = "MD2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the destination path.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports every stage; INFO logs would only
    // interleave with it.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let callback = progress
        .clone()
        .map(|cb| cb as Arc<dyn ConversionProgressCallback>);

    let config = build_config(&cli, callback).await?;

    // ── Run conversion ───────────────────────────────────────────────────
    let result = if cli.html_only {
        convert_to_html(&config).await
    } else {
        let mut backend = ChromiumBackend::new()
            .timeout(Duration::from_secs(cli.timeout))
            .no_sandbox(cli.no_sandbox);
        if let Some(ref chrome) = cli.chrome {
            backend = backend.executable(chrome);
        }
        convert_with_backend(&config, &backend).await
    };

    let destination = match result {
        Ok(path) => path,
        Err(e) => {
            if let Some(ref p) = progress {
                p.abandon();
            }
            return Err(e).context("Conversion failed");
        }
    };

    println!("{}", destination.display());
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let pdf = pdf_options(cli).await?;

    let mut builder = ConversionConfig::builder()
        .source(&cli.source)
        .gh_style(!cli.no_gh_style)
        .default_style(!cli.no_default_style)
        .no_emoji(cli.no_emoji)
        .pdf(pdf);

    builder = match cli.destination {
        Some(ref dest) => builder.destination(dest),
        None if cli.html_only => builder.destination(cli.source.with_extension("html")),
        None => builder.destination_from_source(),
    };

    if let Some(ref p) = cli.header {
        builder = builder.header(p);
    }
    if let Some(ref p) = cli.footer {
        builder = builder.footer(p);
    }
    if let Some(ref p) = cli.styles {
        builder = builder.styles(p);
    }
    if let Some(ref p) = cli.debug_path {
        builder = builder.debug(p);
    } else if cli.debug && !cli.html_only {
        builder = builder.debug_beside_destination();
    }
    if let Some(ref p) = cli.layout {
        builder = builder.layout(p);
    }
    if let Some(ref p) = cli.header_layout {
        builder = builder.header_layout(p);
    }
    if let Some(ref p) = cli.footer_layout {
        builder = builder.footer_layout(p);
    }
    if let Some(ref p) = cli.highlight_js {
        builder = builder.highlight_js(p);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `--pdf-options` file (if any) with the individual flags applied on top.
async fn pdf_options(cli: &Cli) -> Result<PdfOptions> {
    let mut options = match cli.pdf_options {
        Some(ref path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read PDF options from {:?}", path))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Invalid PDF options in {:?}", path))?
        }
        None => PdfOptions::default(),
    };

    if let Some(format) = cli.format {
        options.format = format;
    }
    if cli.landscape {
        options.landscape = true;
    }
    if let Some(ref m) = cli.margin {
        options.margin = Margins::uniform(m.as_str());
    }
    for (side, value) in [
        (&mut options.margin.top, &cli.margin_top),
        (&mut options.margin.right, &cli.margin_right),
        (&mut options.margin.bottom, &cli.margin_bottom),
        (&mut options.margin.left, &cli.margin_left),
    ] {
        if let Some(v) = value {
            side.clone_from(v);
        }
    }
    if cli.no_background {
        options.print_background = false;
    }
    if let Some(scale) = cli.scale {
        if !(0.1..=2.0).contains(&scale) {
            anyhow::bail!("--scale must be between 0.1 and 2.0 (got {scale})");
        }
        options.scale = scale;
    }

    Ok(options)
}

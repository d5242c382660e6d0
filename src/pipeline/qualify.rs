//! Asset path qualification: make relative `<img src>` values absolute.
//!
//! The assembled document is written to a scratch file beside the
//! destination, which need not share a directory with the source. A relative
//! image reference like `img/pic.png` would then resolve against the wrong
//! directory and the image would silently disappear from the PDF. Every
//! fragment (header, footer, body) therefore passes through [`qualify`]
//! before it is embedded in a layout.
//!
//! Only `src` attributes of `<img>` tags are rewritten, whether quoted or
//! not. A relative value is resolved against the asset directory and
//! written back as a double-quoted `file://` URL, percent-encoded so that
//! `#`, `?`, `"` or spaces in directory and file names survive. Absolute
//! paths, protocol-relative references, and anything with a URI scheme
//! (`data:`, `http:`, `https:`, `file:`…) are left exactly as they are,
//! which also makes the operation idempotent.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use tracing::warn;
use url::Url;

/// `<img … src=value …>`; the value is quoted with `"` or `'`, or unquoted.
static RE_IMG_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\ssrc\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#).unwrap()
});

/// RFC 3986 scheme followed by `:`. Requires two characters so a Windows
/// drive letter (`C:`) is not mistaken for a scheme.
static RE_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]+:").unwrap());

/// An HTML fragment whose image references have been qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlFragment {
    html: String,
    asset_dir: PathBuf,
}

impl HtmlFragment {
    pub fn as_str(&self) -> &str {
        &self.html
    }

    /// Directory the relative references were resolved against.
    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    pub fn into_string(self) -> String {
        self.html
    }
}

/// Rewrite every relative `<img src>` in `html` to an absolute `file://`
/// URL under `asset_dir`.
pub fn qualify(html: &str, asset_dir: &Path) -> HtmlFragment {
    let base = Url::from_directory_path(asset_dir).ok();
    if base.is_none() {
        warn!(
            "Asset directory {} is not absolute; image paths left as written",
            asset_dir.display()
        );
    }

    let rewritten = RE_IMG_SRC.replace_all(html, |caps: &Captures<'_>| {
        let Some(value) = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4)) else {
            return caps[0].to_string();
        };
        let value = value.as_str();

        match base.as_ref().and_then(|b| resolve(b, value)) {
            Some(url) => format!("{}\"{url}\"", &caps[1]),
            None => caps[0].to_string(),
        }
    });

    HtmlFragment {
        html: rewritten.into_owned(),
        asset_dir: asset_dir.to_path_buf(),
    }
}

/// Resolve a relative reference against the asset directory URL.
///
/// The value names a file: `#` and `?` are part of the name, not a fragment
/// or query. `%XX` escapes (as comrak writes spaces) keep their meaning.
fn resolve(base: &Url, value: &str) -> Option<Url> {
    if !is_relative_reference(value) {
        return None;
    }
    let path = value.trim().replace('#', "%23").replace('?', "%3F");
    base.join(&path).ok()
}

/// `true` when `value` should be resolved against the asset directory.
pub fn is_relative_reference(value: &str) -> bool {
    let v = value.trim();
    !(v.is_empty()
        || v.starts_with('#')
        || v.starts_with("//")
        || RE_SCHEME.is_match(v)
        || Path::new(v).is_absolute()
        || v.starts_with('/'))
}

//! Server-side syntax highlighting for fenced code blocks.
//!
//! Blocks are tokenised with syntect's bundled grammars and emitted as
//! class-based spans (`hl-keyword`, `hl-string`, …) that `highlight.css`
//! colours. The page therefore prints highlighted without any script.

use crate::error::Md2PdfError;
use once_cell::sync::Lazy;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Prefix of every emitted scope class.
pub const CLASS_PREFIX: &str = "hl-";

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed {
    prefix: CLASS_PREFIX,
};

static SYNTAXES: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// Render one code block as `<pre><code>` with highlighted spans.
///
/// `info` is the fence info string; its first word picks the grammar.
/// Unknown or missing languages fall back to plain text, still escaped.
pub fn highlight_block(info: &str, code: &str) -> Result<String, Md2PdfError> {
    let token = info.split_whitespace().next().map(language_token);
    let syntax = token
        .as_deref()
        .and_then(|t| find_syntax(&SYNTAXES, t))
        .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text());

    let mut source = code.to_string();
    if !source.ends_with('\n') {
        source.push('\n');
    }

    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAXES, CLASS_STYLE);
    for line in LinesWithEndings::from(source.as_str()) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|e| {
                Md2PdfError::Conversion(format!(
                    "highlighting {} block: {e}",
                    token.as_deref().unwrap_or("plain")
                ))
            })?;
    }
    let body = generator.finalize();

    Ok(match token.filter(|t| !t.is_empty()) {
        Some(lang) => format!(
            "<pre class=\"highlight\" data-language=\"{lang}\"><code class=\"language-{lang}\">{body}</code></pre>\n"
        ),
        None => format!("<pre class=\"highlight\"><code>{body}</code></pre>\n"),
    })
}

/// Lowercased language name restricted to characters safe in a class.
fn language_token(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn find_syntax<'a>(set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    set.find_syntax_by_token(token)
        .or_else(|| set.find_syntax_by_name(token))
        .or_else(|| set.find_syntax_by_extension(token))
}

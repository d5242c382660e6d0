//! Markdown → HTML conversion through comrak.
//!
//! The options are built per call from an immutable [`MarkdownOptions`]
//! value, so concurrent conversions with different emoji settings cannot see
//! each other's configuration.
//!
//! The preset mirrors GitHub: tables, strikethrough, autolinks, task lists
//! and footnotes; raw HTML is passed through (header/footer fragments and
//! many READMEs rely on it). Headings get anchor ids with no prefix.
//! Fenced code blocks are replaced by their [`highlight`](super::highlight)
//! rendering before the tree is formatted.

use crate::error::Md2PdfError;
use crate::pipeline::highlight::highlight_block;
use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use comrak::{format_html, parse_document, Arena, Options};

/// Per-conversion markdown settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Replace `:shortcode:` sequences with emoji.
    ///
    /// On by default. This can rewrite literal colon-delimited text, but only
    /// when the text between the colons is a known emoji name.
    pub emoji: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self { emoji: true }
    }
}

impl MarkdownOptions {
    fn comrak_options(&self) -> Options<'static> {
        let mut options = Options::default();

        let ext = &mut options.extension;
        ext.strikethrough = true;
        ext.table = true;
        ext.autolink = true;
        ext.tasklist = true;
        ext.footnotes = true;
        ext.tagfilter = false;
        ext.header_id_prefix = Some(String::new());
        ext.shortcodes = self.emoji;

        let render = &mut options.render;
        render.r#unsafe = true;

        options
    }
}

/// Convert `markdown` to an HTML fragment.
pub fn markdown_to_html(markdown: &str, options: &MarkdownOptions) -> Result<String, Md2PdfError> {
    let comrak_options = options.comrak_options();
    let arena = Arena::new();
    let root = parse_document(&arena, markdown, &comrak_options);
    highlight_code_blocks(root)?;

    let mut html = String::with_capacity(markdown.len() * 2);
    format_html(root, &comrak_options, &mut html)
        .map_err(|e| Md2PdfError::Conversion(e.to_string()))?;
    Ok(html)
}

/// Swap every code block node for pre-rendered highlighted HTML.
fn highlight_code_blocks<'a>(root: &'a AstNode<'a>) -> Result<(), Md2PdfError> {
    for node in root.descendants() {
        let html = match &node.data.borrow().value {
            NodeValue::CodeBlock(block) => highlight_block(&block.info, &block.literal)?,
            _ => continue,
        };
        node.data.borrow_mut().value = NodeValue::HtmlBlock(NodeHtmlBlock {
            block_type: 0,
            literal: html,
        });
    }
    Ok(())
}

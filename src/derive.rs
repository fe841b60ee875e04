//! Derives the presentable parts of a [`SourceFile`]: its title, its rendered
//! HTML body, and a short plain-text preview.
//!
//! The first line of a source file is always its title and never part of its
//! body. Titles written as Markdown headings (`# Intro`) lose their `#`
//! markers and inline formatting but are otherwise kept as written, so
//! `# 1. Introduction` yields `1. Introduction`. Any other first line is
//! reduced to plain text, so `**Intro**` also yields `Intro`.

use crate::markdown::Renderer;
use crate::source::SourceFile;

/// The glyph appended to previews that were cut short.
pub const ELLIPSIS: char = '…';

/// The contract between the pipeline and whatever turns a [`SourceFile`] into
/// displayable text. Implementations must be deterministic: deriving the same
/// file twice must produce identical output.
pub trait DerivationPolicy {
    /// Returns the title for `source`. An empty first line yields an empty
    /// title.
    fn extract_title(&self, source: &SourceFile) -> String;

    /// Returns the HTML rendering of `source`'s body.
    fn render_body(&self, source: &SourceFile) -> String;

    /// Returns at most `limit` characters of `source`'s plain-text body,
    /// followed by [`ELLIPSIS`] if anything was cut.
    fn compute_preview(&self, source: &SourceFile, limit: usize) -> String;
}

/// The standard [`DerivationPolicy`], backed by a [`Renderer`].
#[derive(Clone, Debug, Default)]
pub struct MarkdownPolicy {
    renderer: Renderer,
}

impl MarkdownPolicy {
    pub fn new(renderer: Renderer) -> Self {
        MarkdownPolicy { renderer }
    }
}

impl DerivationPolicy for MarkdownPolicy {
    fn extract_title(&self, source: &SourceFile) -> String {
        let (first_line, _) = split_title_line(&source.content);
        let trimmed = first_line.trim_start();
        if trimmed.starts_with('#') {
            self.renderer.heading_text(trimmed.trim_start_matches('#'))
        } else {
            self.renderer.to_plain_text(first_line)
        }
    }

    fn render_body(&self, source: &SourceFile) -> String {
        let (_, body) = split_title_line(&source.content);
        self.renderer.to_html(body)
    }

    fn compute_preview(&self, source: &SourceFile, limit: usize) -> String {
        let (_, body) = split_title_line(&source.content);
        truncate(&self.renderer.to_plain_text(body), limit)
    }
}

/// Splits `content` into its first line (without the line terminator) and
/// everything after it.
pub fn split_title_line(content: &str) -> (&str, &str) {
    match content.split_once('\n') {
        Some((first, rest)) => (first.trim_end_matches('\r'), rest),
        None => (content.trim_end_matches('\r'), ""),
    }
}

/// Returns `text` unchanged if it has at most `limit` characters; otherwise
/// its first `limit` characters followed by [`ELLIPSIS`].
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        None => text.to_owned(),
        Some((cut, _)) => {
            let mut preview = String::with_capacity(cut + ELLIPSIS.len_utf8());
            preview.push_str(&text[..cut]);
            preview.push(ELLIPSIS);
            preview
        }
    }
}

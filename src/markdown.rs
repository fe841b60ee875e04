//! Converts Markdown into HTML and plain text. Parsing is done by
//! [`pulldown_cmark`]; the resulting event stream is collected and run
//! through a series of pure passes ([`coalesce_text`], [`rewrite_callouts`],
//! [`anchor_headings`]) before being handed to
//! [`crate::htmlrenderer::push_html`].
//!
//! [`Renderer`] carries no mutable state, so one instance can be shared by
//! every derivation worker.

use crate::htmlrenderer::push_html;
use once_cell::sync::Lazy;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag};
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

/// The paragraph prefixes that turn a paragraph into a styled callout.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CalloutMarkers {
    /// Marker for tips, rendered as `<blockquote class="tip">`.
    pub tip: String,

    /// Marker for warnings, rendered as `<blockquote class="warning">`.
    pub warning: String,
}

impl Default for CalloutMarkers {
    fn default() -> Self {
        CalloutMarkers {
            tip: String::from("T>"),
            warning: String::from("W>"),
        }
    }
}

impl CalloutMarkers {
    /// Returns the callout class and marker length for a paragraph whose
    /// text begins with `text`, if it begins with a marker.
    fn match_prefix(&self, text: &str) -> Option<(&'static str, usize)> {
        [("tip", &self.tip), ("warning", &self.warning)]
            .iter()
            .find(|(_, marker)| {
                !marker.is_empty() && text.starts_with(marker.as_str())
            })
            .map(|(class, marker)| (*class, marker.len()))
    }
}

/// Renders Markdown bodies. Construct one and pass it to whatever needs to
/// render; it holds only configuration.
#[derive(Clone, Debug)]
pub struct Renderer {
    options: Options,
    callouts: CalloutMarkers,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new(CalloutMarkers::default())
    }
}

impl Renderer {
    pub fn new(callouts: CalloutMarkers) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);
        Renderer { options, callouts }
    }

    /// Parses `markdown` into a list of events.
    pub fn events<'a>(&self, markdown: &'a str) -> Vec<Event<'a>> {
        Parser::new_ext(markdown, self.options).collect()
    }

    /// Converts `markdown` to HTML with callouts rewritten and heading
    /// anchors added.
    pub fn to_html(&self, markdown: &str) -> String {
        let events = coalesce_text(self.events(markdown));
        let events = rewrite_callouts(events, &self.callouts);
        let events = anchor_headings(events);

        let mut html = String::with_capacity(markdown.len() * 3 / 2);
        if let Err(err) = push_html(&mut html, events) {
            warn!(error = %err, "rendering markdown to html");
        }
        html
    }

    /// Strips all Markdown formatting from `markdown`. Text and inline code
    /// are kept, raw HTML is dropped, and block boundaries and line breaks
    /// become newlines. The result is trimmed.
    pub fn to_plain_text(&self, markdown: &str) -> String {
        let mut text = String::with_capacity(markdown.len());
        for event in Parser::new_ext(markdown, self.options) {
            match event {
                Event::Text(s) | Event::Code(s) => text.push_str(&s),
                Event::SoftBreak | Event::HardBreak => text.push('\n'),
                Event::End(Tag::TableCell) => text.push(' '),
                Event::End(tag) if is_block(&tag) => {
                    if !text.is_empty() && !text.ends_with('\n') {
                        text.push('\n');
                    }
                }
                _ => (),
            }
        }
        text.trim().to_owned()
    }

    /// Returns the text of an ATX heading given without its leading `#`
    /// markers. Inline formatting is stripped and any closing `#` sequence
    /// removed, but the text is never read as a block of its own, so
    /// `1. Intro` stays as it is. Raw HTML is kept as written.
    pub fn heading_text(&self, heading: &str) -> String {
        let markdown = format!("# {}", heading.trim());
        let mut text = String::with_capacity(markdown.len());
        for event in Parser::new_ext(&markdown, self.options) {
            match event {
                Event::Text(s) | Event::Code(s) | Event::Html(s) => {
                    text.push_str(&s)
                }
                _ => (),
            }
        }
        text.trim().to_owned()
    }
}

fn is_block(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::Paragraph
            | Tag::Heading(_)
            | Tag::BlockQuote
            | Tag::CodeBlock(_)
            | Tag::Item
            | Tag::FootnoteDefinition(_)
            | Tag::TableHead
            | Tag::TableRow
    )
}

/// Merges runs of adjacent [`Event::Text`] events into one. The parser may
/// split a single run of text at punctuation; later passes look at a
/// paragraph's leading text and need it whole.
pub fn coalesce_text(events: Vec<Event>) -> Vec<Event> {
    let mut out: Vec<Event> = Vec::with_capacity(events.len());
    for event in events {
        if let Event::Text(text) = &event {
            if let Some(Event::Text(prev)) = out.last_mut() {
                let mut merged = String::with_capacity(prev.len() + text.len());
                merged.push_str(&**prev);
                merged.push_str(&**text);
                *prev = CowStr::from(merged);
                continue;
            }
        }
        out.push(event);
    }
    out
}

/// Rewrites paragraphs whose text starts with a callout marker into
/// `<blockquote class="...">` elements. The marker is consumed and the
/// remaining text loses its leading whitespace; the paragraph tags are
/// replaced, not nested.
pub fn rewrite_callouts<'a>(
    events: Vec<Event<'a>>,
    markers: &CalloutMarkers,
) -> Vec<Event<'a>> {
    let mut out = Vec::with_capacity(events.len());
    let mut events = events.into_iter().peekable();
    let mut in_callout = false;

    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::Paragraph) => {
                let callout = match events.peek() {
                    Some(Event::Text(text)) => markers.match_prefix(text),
                    _ => None,
                };
                let (class, marker_len) = match callout {
                    Some(callout) => callout,
                    None => {
                        out.push(Event::Start(Tag::Paragraph));
                        continue;
                    }
                };

                out.push(Event::Html(CowStr::from(format!(
                    r#"<blockquote class="{}">"#,
                    class
                ))));
                if let Some(Event::Text(text)) = events.next() {
                    let text: &str = &text;
                    let rest = text[marker_len..].trim_start();
                    if rest.is_empty() {
                        // `T>` alone on its line
                        while let Some(Event::SoftBreak | Event::HardBreak) =
                            events.peek()
                        {
                            events.next();
                        }
                    } else {
                        out.push(Event::Text(CowStr::from(rest.to_owned())));
                    }
                }
                in_callout = true;
            }
            Event::End(Tag::Paragraph) if in_callout => {
                in_callout = false;
                out.push(Event::Html(CowStr::Borrowed("</blockquote>\n")));
            }
            event => out.push(event),
        }
    }
    out
}

/// Gives every heading an `id` derived from its text (see [`slugify`]) and
/// appends a `#` self-link inside the heading tag.
pub fn anchor_headings(events: Vec<Event>) -> Vec<Event> {
    let mut out = Vec::with_capacity(events.len());
    // index in `out` of the open heading's start tag
    let mut open: Option<usize> = None;
    let mut text = String::new();

    for event in events {
        if open.is_some() {
            if let Event::Text(s) | Event::Code(s) = &event {
                text.push_str(s);
            }
        }
        match event {
            Event::Start(Tag::Heading(level)) => {
                open = Some(out.len());
                text.clear();
                out.push(Event::Start(Tag::Heading(level)));
            }
            Event::End(Tag::Heading(level)) => match open.take() {
                Some(start) => {
                    let slug = slugify(&text);
                    out[start] = Event::Html(CowStr::from(format!(
                        r#"<h{} id="{}">"#,
                        level, slug
                    )));
                    out.push(Event::Html(CowStr::from(format!(
                        "<a class=\"anchor\" href=\"#{}\">#</a></h{}>\n",
                        slug, level
                    ))));
                }
                None => out.push(Event::End(Tag::Heading(level))),
            },
            event => out.push(event),
        }
    }
    out
}

/// Lowercases `text` and replaces every run of characters outside
/// `[A-Za-z0-9_]` with a single `-`. Leading and trailing runs are kept, so
/// `Getting Started!` becomes `getting-started-`.
pub fn slugify(text: &str) -> String {
    static NON_WORD: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid regex"));
    NON_WORD.replace_all(&text.to_lowercase(), "-").into_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!("getting-started-", slugify("Getting Started!"));
        assert_eq!("getting-started-", slugify("Getting Started!"));
        assert_eq!("-why_rust-", slugify("  Why_Rust?"));
        assert_eq!("caf-", slugify("Café"));
    }

    #[test]
    fn test_tip_callout() {
        let html = Renderer::default().to_html("T> remember this");
        assert!(
            html.contains(
                r#"<blockquote class="tip">remember this</blockquote>"#
            ),
            "{}",
            html
        );
        assert!(!html.contains("<p>"));
    }

    #[test]
    fn test_warning_callout_keeps_inline_markup() {
        let html = Renderer::default().to_html("W>   mind the *gap*\n");
        assert_eq!(
            concat!(
                "<blockquote class=\"warning\">",
                "mind the <em>gap</em></blockquote>\n",
            ),
            html
        );
    }

    #[test]
    fn test_callout_markers_configurable() {
        let renderer = Renderer::new(CalloutMarkers {
            tip: String::from("TIP:"),
            warning: String::new(),
        });
        assert_eq!(
            "<blockquote class=\"tip\">ok</blockquote>\n<p>W&gt; plain</p>\n",
            renderer.to_html("TIP: ok\n\nW> plain"),
        );
    }

    #[test]
    fn test_marker_alone_on_first_line() {
        assert_eq!(
            "<blockquote class=\"tip\">remember</blockquote>\n",
            Renderer::default().to_html("T>\nremember"),
        );
        assert_eq!(
            "<blockquote class=\"warning\">careful</blockquote>\n",
            Renderer::default().to_html("W>  \ncareful"),
        );
    }

    #[test]
    fn test_heading_text() {
        let renderer = Renderer::default();
        assert_eq!("Part *one*", renderer.heading_text(r" Part \*one\* "));
        assert_eq!("Using cargo", renderer.heading_text("Using `cargo` ###"));
        assert_eq!("2) Setup", renderer.heading_text("2) Setup"));
    }

    #[test]
    fn test_marker_mid_paragraph_ignored() {
        assert_eq!(
            "<p>see T&gt; here</p>\n",
            Renderer::default().to_html("see T> here")
        );
    }

    #[test]
    fn test_heading_anchor() {
        assert_eq!(
            concat!(
                "<h2 id=\"getting-started-\">Getting Started!",
                "<a class=\"anchor\" href=\"#getting-started-\">#</a></h2>\n",
            ),
            Renderer::default().to_html("## Getting Started!"),
        );
    }

    #[test]
    fn test_heading_anchor_includes_code() {
        let html = Renderer::default().to_html("# Using `cargo`");
        let want = r#"<h1 id="using-cargo">Using <code>cargo</code>"#;
        assert!(html.starts_with(want), "{}", html);
    }

    #[test]
    fn test_coalesce_text() {
        let events = vec![
            Event::Text(CowStr::Borrowed("a")),
            Event::Text(CowStr::Borrowed("b")),
            Event::SoftBreak,
            Event::Text(CowStr::Borrowed("c")),
        ];
        assert_eq!(
            vec![
                Event::Text(CowStr::Borrowed("ab")),
                Event::SoftBreak,
                Event::Text(CowStr::Borrowed("c")),
            ],
            coalesce_text(events),
        );
    }

    #[test]
    fn test_plain_text() {
        let renderer = Renderer::default();
        assert_eq!(
            "Title\nSome bold and code.\none\ntwo",
            renderer.to_plain_text(
                "## Title\n\nSome **bold** and `code`.\n\n- one\n- two\n"
            ),
        );
    }

    #[test]
    fn test_plain_text_drops_html_and_links() {
        assert_eq!(
            "a link and tag",
            Renderer::default()
                .to_plain_text("a [link](http://x.org) and <b>tag</b>"),
        );
    }

    #[test]
    fn test_malformed_markdown_degrades() {
        let html = Renderer::default().to_html("**unclosed [link](");
        assert_eq!("<p>**unclosed [link](</p>\n", html);
    }
}

//! Implements [`push_html`], an event-driven HTML writer modeled after
//! [`pulldown_cmark`]'s private [`HtmlWriter`
//! struct](https://github.com/raphlinus/pulldown-cmark/blob/bf0a1a4938dbd2ec41c3add069b3d361d11731f4/src/html.rs#L36-L50).
//! Unlike [`pulldown_cmark::html::push_html`], it writes image alt text into
//! the `alt` attribute rather than emitting it as page text, and it's the
//! single place where rendered chapter bodies are produced, so every event
//! pass in [`crate::markdown`] lands here.

use pulldown_cmark::escape::{escape_href, escape_html, StrWrite};
use pulldown_cmark::{Alignment, CodeBlockKind, CowStr, Event, LinkType, Tag};
use std::io;

enum TableState {
    Head,
    Body,
}

/// State for an image whose alt text is still being collected. Alt text
/// arrives as events between `Start(Image)` and `End(Image)`.
struct PendingImage<'a> {
    title: CowStr<'a>,
    depth: usize,
}

struct HtmlRenderer<'a> {
    table_alignments: Vec<Alignment>,
    table_state: TableState,
    table_cell_index: usize,
    image: Option<PendingImage<'a>>,
}

impl<'a> HtmlRenderer<'a> {
    fn new() -> Self {
        HtmlRenderer {
            table_alignments: Vec::new(),
            table_state: TableState::Head,
            table_cell_index: 0,
            image: None,
        }
    }

    fn on_event<W: StrWrite>(
        &mut self,
        w: &mut W,
        event: Event<'a>,
    ) -> io::Result<()> {
        if self.image.is_some() {
            return self.on_alt_event(w, event);
        }
        match event {
            Event::Start(tag) => self.on_start(w, tag),
            Event::End(tag) => self.on_end(w, tag),
            Event::Text(text) => escape_html(w, &text),
            Event::Code(code) => {
                w.write_str("<code>")?;
                escape_html(&mut *w, &code)?;
                w.write_str("</code>")
            }
            Event::Html(html) => w.write_str(&html),
            Event::FootnoteReference(name) => {
                w.write_str(r##"<sup class="footnote-reference"><a href="#"##)?;
                escape_html(&mut *w, &name)?;
                w.write_str(r#"">"#)?;
                escape_html(&mut *w, &name)?;
                w.write_str("</a></sup>")
            }
            Event::SoftBreak => w.write_str("\n"),
            Event::HardBreak => w.write_str("<br />\n"),
            Event::Rule => w.write_str("<hr />\n"),
            Event::TaskListMarker(checked) => w.write_str(match checked {
                true => r#"<input disabled="" type="checkbox" checked="" />"#,
                false => r#"<input disabled="" type="checkbox" />"#,
            }),
        }
    }

    // Inside an image only plain text survives, escaped for the attribute.
    fn on_alt_event<W: StrWrite>(
        &mut self,
        w: &mut W,
        event: Event<'a>,
    ) -> io::Result<()> {
        match event {
            Event::Start(_) => {
                if let Some(image) = self.image.as_mut() {
                    image.depth += 1;
                }
            }
            Event::End(_) => match self.image.take() {
                Some(mut image) if image.depth > 0 => {
                    image.depth -= 1;
                    self.image = Some(image);
                }
                Some(image) => {
                    if !image.title.is_empty() {
                        w.write_str(r#"" title=""#)?;
                        escape_html(&mut *w, &image.title)?;
                    }
                    w.write_str(r#"" />"#)?;
                }
                None => (),
            },
            Event::Text(text) | Event::Code(text) | Event::Html(text) => {
                escape_html(&mut *w, &text)?
            }
            Event::SoftBreak | Event::HardBreak => w.write_str(" ")?,
            _ => (),
        }
        Ok(())
    }

    fn on_start<W: StrWrite>(
        &mut self,
        w: &mut W,
        tag: Tag<'a>,
    ) -> io::Result<()> {
        match tag {
            Tag::Paragraph => w.write_str("<p>"),
            Tag::Heading(level) => write!(w, "<h{}>", level),
            Tag::BlockQuote => w.write_str("<blockquote>\n"),
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
                match info.split_whitespace().next() {
                    Some(lang) => {
                        w.write_str(r#"<pre><code class="language-"#)?;
                        escape_html(&mut *w, lang)?;
                        w.write_str(r#"">"#)
                    }
                    None => w.write_str("<pre><code>"),
                }
            }
            Tag::CodeBlock(CodeBlockKind::Indented) => {
                w.write_str("<pre><code>")
            }
            Tag::List(None) => w.write_str("<ul>\n"),
            Tag::List(Some(1)) => w.write_str("<ol>\n"),
            Tag::List(Some(start)) => write!(w, "<ol start=\"{}\">\n", start),
            Tag::Item => w.write_str("<li>"),
            Tag::FootnoteDefinition(name) => {
                w.write_str(r#"<div class="footnote-definition" id=""#)?;
                escape_html(&mut *w, &name)?;
                w.write_str(r#""><sup class="footnote-definition-label">"#)?;
                escape_html(&mut *w, &name)?;
                w.write_str("</sup>")
            }
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                w.write_str("<table>")
            }
            Tag::TableHead => {
                self.table_state = TableState::Head;
                self.table_cell_index = 0;
                w.write_str("<thead><tr>")
            }
            Tag::TableRow => {
                self.table_cell_index = 0;
                w.write_str("<tr>")
            }
            Tag::TableCell => write!(
                w,
                "<{}{}>",
                match self.table_state {
                    TableState::Head => "th",
                    TableState::Body => "td",
                },
                match self.table_alignments.get(self.table_cell_index) {
                    Some(Alignment::Left) => r#" align="left""#,
                    Some(Alignment::Right) => r#" align="right""#,
                    Some(Alignment::Center) => r#" align="center""#,
                    _ => "",
                }
            ),
            Tag::Emphasis => w.write_str("<em>"),
            Tag::Strong => w.write_str("<strong>"),
            Tag::Strikethrough => w.write_str("<del>"),
            Tag::Link(LinkType::Email, dest, title) => {
                w.write_str(r#"<a href="mailto:"#)?;
                self.write_link_rest(w, dest, title)
            }
            Tag::Link(_, dest, title) => {
                w.write_str(r#"<a href=""#)?;
                self.write_link_rest(w, dest, title)
            }
            Tag::Image(_, dest, title) => {
                w.write_str(r#"<img src=""#)?;
                escape_href(&mut *w, &dest)?;
                w.write_str(r#"" alt=""#)?;
                self.image = Some(PendingImage { title, depth: 0 });
                Ok(())
            }
        }
    }

    fn write_link_rest<W: StrWrite>(
        &self,
        w: &mut W,
        dest: CowStr,
        title: CowStr,
    ) -> io::Result<()> {
        escape_href(&mut *w, &dest)?;
        if !title.is_empty() {
            w.write_str(r#"" title=""#)?;
            escape_html(&mut *w, &title)?;
        }
        w.write_str(r#"">"#)
    }

    fn on_end<W: StrWrite>(&mut self, w: &mut W, tag: Tag) -> io::Result<()> {
        match tag {
            Tag::Paragraph => w.write_str("</p>\n"),
            Tag::Heading(level) => write!(w, "</h{}>\n", level),
            Tag::BlockQuote => w.write_str("</blockquote>\n"),
            Tag::CodeBlock(_) => w.write_str("</code></pre>\n"),
            Tag::List(Some(_)) => w.write_str("</ol>\n"),
            Tag::List(None) => w.write_str("</ul>\n"),
            Tag::Item => w.write_str("</li>\n"),
            Tag::FootnoteDefinition(_) => w.write_str("</div>\n"),
            Tag::Table(_) => w.write_str("</tbody></table>\n"),
            Tag::TableHead => {
                self.table_state = TableState::Body;
                w.write_str("</tr></thead><tbody>")
            }
            Tag::TableRow => w.write_str("</tr>"),
            Tag::TableCell => {
                self.table_cell_index += 1;
                w.write_str(match self.table_state {
                    TableState::Head => "</th>",
                    TableState::Body => "</td>",
                })
            }
            Tag::Emphasis => w.write_str("</em>"),
            Tag::Strong => w.write_str("</strong>"),
            Tag::Strikethrough => w.write_str("</del>"),
            Tag::Link(_, _, _) => w.write_str("</a>"),
            // consumed by `on_alt_event`
            Tag::Image(_, _, _) => Ok(()),
        }
    }
}

/// Renders `events` as HTML, appending the result to `out`.
pub fn push_html<'a, I>(out: &mut String, events: I) -> io::Result<()>
where
    I: IntoIterator<Item = Event<'a>>,
{
    let mut renderer = HtmlRenderer::new();
    for event in events {
        renderer.on_event(out, event)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use pulldown_cmark::{Options, Parser};

    fn render(markdown: &str) -> String {
        let mut out = String::new();
        push_html(&mut out, Parser::new_ext(markdown, Options::all())).unwrap();
        out
    }

    #[test]
    fn test_paragraph_escapes_text() {
        assert_eq!("<p>a &lt; b &amp; c</p>\n", render("a < b & c"));
    }

    #[test]
    fn test_image_alt_text() {
        assert_eq!(
            "<p><img src=\"cat.png\" alt=\"a cat\" title=\"Cat\" /></p>\n",
            render("![a *cat*](cat.png \"Cat\")"),
        );
    }

    #[test]
    fn test_fenced_code_language() {
        assert_eq!(
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>\n",
            render("```rust\nfn main() {}\n```"),
        );
    }

    #[test]
    fn test_link_title_omitted_when_empty() {
        assert_eq!(
            "<p><a href=\"https://example.org\">site</a></p>\n",
            render("[site](https://example.org)"),
        );
    }

    #[test]
    fn test_table_alignment() {
        assert_eq!(
            concat!(
                "<table><thead><tr><th align=\"right\">n</th></tr></thead>",
                "<tbody><tr><td align=\"right\">1</td></tr></tbody></table>\n",
            ),
            render("| n |\n|--:|\n| 1 |"),
        );
    }
}

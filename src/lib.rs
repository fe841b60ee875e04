//! The library code for the `quire` book generator. A build turns a directory
//! of Markdown chapters into an ordered list of
//! [`item::ContentItem`]s and writes them out for a theming layer to display.
//! The work happens in four stages, stitched together by
//! [`pipeline::Pipeline`]:
//!
//! 1. Discovering the source files on disk ([`crate::source`])
//! 2. Ordering them according to the author's manifest ([`crate::order`])
//! 3. Deriving a title, HTML body and preview for each ([`crate::derive`])
//! 4. Linking every item to its neighbors ([`crate::item`])
//!
//! Derivation is the involved step. Each file's first line is its title and
//! the rest is its body; the body is parsed with `pulldown-cmark` and the
//! resulting events are rewritten by small pure passes ([`crate::markdown`])
//! that turn `T>`/`W>` paragraphs into callouts and give headings anchors,
//! before being rendered to HTML ([`crate::htmlrenderer`]).
//!
//! None of the stages fail: missing directories, missing manifests and
//! dangling manifest entries are logged and produce fewer items. Only
//! loading the configuration ([`crate::config`]) and writing the output
//! ([`crate::write`]) can return errors.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod derive;
pub mod htmlrenderer;
pub mod item;
pub mod manifest;
pub mod markdown;
pub mod order;
pub mod pipeline;
pub mod source;
pub mod write;

//! Exports the [`build_book`] function which ties a loaded [`Config`] to the
//! stages that do the work: running the manuscript [`Pipeline`] and writing
//! its output with a [`Writer`].

use crate::config::Config;
use crate::derive::MarkdownPolicy;
use crate::item::ContentItem;
use crate::markdown::Renderer;
use crate::pipeline::Pipeline;
use crate::write::{Result, Writer};
use std::path::Path;

/// Constructs the pipeline described by `config`, with the standard Markdown
/// derivation policy.
pub fn pipeline(config: &Config) -> Pipeline<MarkdownPolicy> {
    let renderer = Renderer::new(config.callout_markers.clone());
    Pipeline::new(MarkdownPolicy::new(renderer), config.pipeline.clone())
}

/// Derives every content item for the project described by `config`.
pub fn collect_items(config: &Config) -> Vec<ContentItem> {
    pipeline(config).run(&config.manuscript_directory, &config.manifest_path)
}

/// Builds the book from a [`Config`] and writes it into `output_directory`,
/// returning the items that were written. The output directory may not be,
/// or contain, the project root or the manuscript directory.
pub fn build_book(
    config: &Config,
    output_directory: &Path,
) -> Result<Vec<ContentItem>> {
    let items = collect_items(config);
    let protected = [
        config.project_root.as_path(),
        config.manuscript_directory.as_path(),
    ];
    Writer {
        output_directory,
        protected: &protected,
    }
    .write_items(&items)?;
    Ok(items)
}

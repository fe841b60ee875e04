//! Exports [`Pipeline`], which stitches together the stages that turn a
//! manuscript directory into linked [`ContentItem`]s: discovering source
//! files ([`crate::source`]), putting them in manifest order
//! ([`crate::order`]), deriving titles, bodies and previews
//! ([`crate::derive`]), and finally linking neighbors ([`crate::item`]).
//!
//! Derivation is independent per file, so it is spread over a pool of worker
//! threads. Linking waits until every worker has finished.

use crate::derive::DerivationPolicy;
use crate::item::{item_url, link, ContentItem};
use crate::manifest::OrderManifest;
use crate::order::{order, OrderingOptions};
use crate::source::{discover, MatchRule, SourceFile};
use crossbeam_channel::unbounded;
use std::path::Path;
use std::thread;
use tracing::{debug, info};

/// The preview length used when none is configured.
pub const DEFAULT_PREVIEW_LIMIT: usize = 150;

#[derive(Clone, Debug)]
pub struct PipelineOptions {
    /// Which files under the manuscript directory are sources.
    pub rule: MatchRule,

    /// How discovered files are reconciled with the manifest.
    pub ordering: OrderingOptions,

    /// Maximum number of characters in a preview, not counting the ellipsis.
    pub preview_limit: usize,

    /// Number of derivation workers. Values below 2 derive on the calling
    /// thread.
    pub threads: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            rule: MatchRule::default(),
            ordering: OrderingOptions::default(),
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            threads: num_cpus::get(),
        }
    }
}

/// Builds [`ContentItem`]s using a [`DerivationPolicy`].
pub struct Pipeline<P> {
    policy: P,
    options: PipelineOptions,
}

impl<P: DerivationPolicy + Sync> Pipeline<P> {
    pub fn new(policy: P, options: PipelineOptions) -> Self {
        Pipeline { policy, options }
    }

    /// Discovers the sources under `manuscript_directory`, loads the manifest
    /// at `manifest_path`, and runs the remaining stages. A missing directory
    /// or manifest is not an error; it just yields fewer (or no) items.
    pub fn run(
        &self,
        manuscript_directory: &Path,
        manifest_path: &Path,
    ) -> Vec<ContentItem> {
        let sources = discover(manuscript_directory, &self.options.rule);
        let manifest = OrderManifest::load(manifest_path);
        self.run_sources(sources, manifest.as_ref())
    }

    /// Orders, derives, and links already-discovered `sources`.
    pub fn run_sources(
        &self,
        sources: Vec<SourceFile>,
        manifest: Option<&OrderManifest>,
    ) -> Vec<ContentItem> {
        let discovered = sources.len();
        let ordered = order(sources, manifest, &self.options.ordering);
        let mut items = self.derive_all(&ordered);
        link(&mut items);
        info!(discovered, items = items.len(), "built content items");
        items
    }

    fn derive(&self, order: usize, source: &SourceFile) -> ContentItem {
        debug!(id = %source.id, order, "deriving content item");
        ContentItem {
            id: source.id.clone(),
            title: self.policy.extract_title(source),
            html: self.policy.render_body(source),
            preview: self
                .policy
                .compute_preview(source, self.options.preview_limit),
            order,
            url: item_url(&source.id),
            previous: None,
            next: None,
        }
    }

    fn derive_all(&self, sources: &[SourceFile]) -> Vec<ContentItem> {
        let threads = self.options.threads.min(sources.len());
        if threads < 2 {
            sources
                .iter()
                .enumerate()
                .map(|(i, source)| self.derive(i, source))
                .collect()
        } else {
            self.derive_parallel(sources, threads)
        }
    }

    // Workers pull (index, source) jobs off a shared channel; the index
    // restores manifest order once they've all joined.
    fn derive_parallel(
        &self,
        sources: &[SourceFile],
        threads: usize,
    ) -> Vec<ContentItem> {
        let (tx, rx) = unbounded::<(usize, &SourceFile)>();
        for job in sources.iter().enumerate() {
            if tx.send(job).is_err() {
                break;
            }
        }
        drop(tx);

        let mut items: Vec<ContentItem> = thread::scope(|scope| {
            let workers: Vec<_> = (0..threads)
                .map(|_| {
                    let rx = rx.clone();
                    scope.spawn(move || {
                        rx.iter()
                            .map(|(i, source)| self.derive(i, source))
                            .collect::<Vec<ContentItem>>()
                    })
                })
                .collect();

            workers
                .into_iter()
                .flat_map(|worker| match worker.join() {
                    Ok(items) => items,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        items.sort_by_key(|item| item.order);
        items
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::derive::MarkdownPolicy;
    use crate::order::{MissingManifestPolicy, OrderDirection};

    fn pipeline(threads: usize) -> Pipeline<MarkdownPolicy> {
        Pipeline::new(
            MarkdownPolicy::default(),
            PipelineOptions {
                threads,
                ..PipelineOptions::default()
            },
        )
    }

    fn abc() -> Vec<SourceFile> {
        vec![
            SourceFile::new("A", "# Intro\nfirst"),
            SourceFile::new("B", "# Middle\nsecond"),
            SourceFile::new("C", "# End\nthird"),
        ]
    }

    #[test]
    fn test_manifest_subset_linking() {
        let manifest: OrderManifest = vec!["B", "A"].into_iter().collect();
        let items = pipeline(1).run_sources(abc(), Some(&manifest));

        assert_eq!(2, items.len());
        let (b, a) = (&items[0], &items[1]);
        assert_eq!(("B", 0), (b.id.as_str(), b.order));
        assert_eq!(("A", 1), (a.id.as_str(), a.order));
        assert_eq!("Intro", b.next.as_ref().unwrap().title);
        assert_eq!("Middle", a.previous.as_ref().unwrap().title);
        assert_eq!(None, b.previous);
        assert_eq!(None, a.next);
        for item in &items {
            for r in item.previous.iter().chain(item.next.iter()) {
                assert_ne!("End", r.title);
            }
        }
    }

    #[test]
    fn test_empty_manifest_yields_nothing() {
        let manifest = OrderManifest::default();
        let items = pipeline(4).run_sources(abc(), Some(&manifest));
        assert!(items.is_empty());
    }

    #[test]
    fn test_order_contiguous() {
        let manifest: OrderManifest = vec!["C", "A", "B"].into_iter().collect();
        let items = pipeline(2).run_sources(abc(), Some(&manifest));
        let orders: Vec<usize> = items.iter().map(|i| i.order).collect();
        assert_eq!(vec![0, 1, 2], orders);
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                let previous = item.previous.as_ref().map(|r| &r.title);
                assert_eq!(Some(&items[i - 1].title), previous);
            }
            if i + 1 < items.len() {
                let next = item.next.as_ref().map(|r| &r.url);
                assert_eq!(Some(&items[i + 1].url), next);
            }
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sources: Vec<SourceFile> = (0..40)
            .map(|i| {
                SourceFile::new(
                    format!("{:02}_chapter{}.md", i, i),
                    format!(
                        concat!(
                            "# Chapter {0}\n\nT> tip {0}\n\n",
                            "## Section {0}\n\nbody *{0}*",
                        ),
                        i
                    ),
                )
            })
            .collect();
        let manifest: OrderManifest =
            sources.iter().rev().map(|s| s.id.clone()).collect();

        let sequential =
            pipeline(1).run_sources(sources.clone(), Some(&manifest));
        let parallel = pipeline(8).run_sources(sources, Some(&manifest));
        assert_eq!(40, parallel.len());
        assert_eq!(sequential, parallel);
        assert_eq!("Chapter 39", parallel[0].title);
        assert_eq!("chapter39", parallel[0].url);
    }

    #[test]
    fn test_prepend_direction() {
        let manifest: OrderManifest = vec!["A", "B", "C"].into_iter().collect();
        let pipeline = Pipeline::new(
            MarkdownPolicy::default(),
            PipelineOptions {
                ordering: OrderingOptions {
                    direction: OrderDirection::Prepend,
                    ..OrderingOptions::default()
                },
                ..PipelineOptions::default()
            },
        );
        let titles: Vec<String> = pipeline
            .run_sources(abc(), Some(&manifest))
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(vec!["End", "Middle", "Intro"], titles);
    }

    #[test]
    fn test_run_fixture() {
        let items = pipeline(2).run(
            Path::new("./testdata/manuscript"),
            Path::new("./testdata/manuscript/Book.txt"),
        );

        assert_eq!(2, items.len());
        assert_eq!("02_middle.md", items[0].id);
        assert_eq!("Middle", items[0].title);
        assert_eq!("middle", items[0].url);
        assert!(items[0]
            .html
            .contains(r#"<h2 id="getting-started-">Getting Started!"#));
        assert!(items[0].html.contains(
            r#"<blockquote class="warning">Do not skip this step.</blockquote>"#
        ));
        assert_eq!("intro", items[0].next.as_ref().unwrap().url);

        assert_eq!("Intro", items[1].title);
        assert!(items[1].preview.starts_with("Welcome to the book."));
        assert_eq!("middle", items[1].previous.as_ref().unwrap().url);
    }

    #[test]
    fn test_run_missing_everything() {
        let items = pipeline(2).run(
            Path::new("./testdata/nowhere"),
            Path::new("./testdata/nowhere/Book.txt"),
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_missing_manifest_discovery_fallback() {
        let pipeline = Pipeline::new(
            MarkdownPolicy::default(),
            PipelineOptions {
                ordering: OrderingOptions {
                    missing_manifest: MissingManifestPolicy::Discovery,
                    ..OrderingOptions::default()
                },
                ..PipelineOptions::default()
            },
        );
        let items = pipeline.run(
            Path::new("./testdata/manuscript"),
            Path::new("./testdata/manuscript/Missing.txt"),
        );
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            vec![
                "01_intro.md",
                "02_middle.md",
                "03_end.md",
                "appendix/01_glossary.md"
            ],
            ids
        );
        assert_eq!("appendix/glossary", items[3].url);
    }
}

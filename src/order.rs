//! Reconciles discovered [`SourceFile`]s against an [`OrderManifest`] to
//! produce the final reading order. The manifest is authoritative: files it
//! doesn't mention are handled by a single configured [`UnlistedPolicy`], and
//! entries with no matching file are skipped with a warning.

use crate::manifest::OrderManifest;
use crate::source::SourceFile;
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::warn;

/// Where each matched manifest entry is inserted into the result.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Manifest order is preserved top-to-bottom.
    Append,

    /// Each entry goes to the front, so the last manifest line comes first.
    Prepend,
}

impl Default for OrderDirection {
    fn default() -> Self {
        OrderDirection::Append
    }
}

/// What happens to discovered files the manifest doesn't list.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnlistedPolicy {
    /// Unlisted files are excluded from the output.
    Drop,

    /// Unlisted files follow the manifest entries, sorted by id.
    Append,
}

impl Default for UnlistedPolicy {
    fn default() -> Self {
        UnlistedPolicy::Drop
    }
}

/// What happens when there is no manifest file at all. A manifest that exists
/// but has no entries always yields an empty sequence.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingManifestPolicy {
    /// No manifest means no content.
    Empty,

    /// Every discovered file, sorted by id.
    Discovery,
}

impl Default for MissingManifestPolicy {
    fn default() -> Self {
        MissingManifestPolicy::Empty
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderingOptions {
    pub direction: OrderDirection,
    pub unlisted: UnlistedPolicy,
    pub missing_manifest: MissingManifestPolicy,

    /// Count only the first occurrence of a repeated manifest entry.
    pub dedupe: bool,
}

/// Arranges `sources` in final reading order. See the module docs and
/// [`OrderingOptions`] for the rules.
pub fn order(
    sources: Vec<SourceFile>,
    manifest: Option<&OrderManifest>,
    options: &OrderingOptions,
) -> Vec<SourceFile> {
    let manifest = match manifest {
        Some(manifest) => manifest,
        None => {
            return match options.missing_manifest {
                MissingManifestPolicy::Empty => Vec::new(),
                MissingManifestPolicy::Discovery => sorted_by_id(sources),
            }
        }
    };

    let by_id: HashMap<&str, &SourceFile> =
        sources.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut used: HashSet<&str> = HashSet::new();
    let mut ordered: VecDeque<SourceFile> =
        VecDeque::with_capacity(manifest.len());

    for entry in manifest.entries() {
        let source = match by_id.get(entry.as_str()) {
            Some(source) => *source,
            None => {
                warn!(%entry, "manifest entry has no matching source file");
                continue;
            }
        };
        if !used.insert(source.id.as_str()) && options.dedupe {
            continue;
        }
        match options.direction {
            OrderDirection::Append => ordered.push_back(source.clone()),
            OrderDirection::Prepend => ordered.push_front(source.clone()),
        }
    }

    let mut ordered: Vec<SourceFile> = ordered.into();
    if options.unlisted == UnlistedPolicy::Append && !manifest.is_empty() {
        let unlisted = sources
            .iter()
            .filter(|s| !used.contains(s.id.as_str()))
            .cloned()
            .collect();
        ordered.extend(sorted_by_id(unlisted));
    }
    ordered
}

fn sorted_by_id(mut sources: Vec<SourceFile>) -> Vec<SourceFile> {
    sources.sort_by(|a, b| a.id.cmp(&b.id));
    sources
}

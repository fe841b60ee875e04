//! Defines the [`SourceFile`] and [`MatchRule`] types and the [`discover`]
//! function, which walks a manuscript directory and reads every matching file
//! into memory. Discovery never fails: a missing directory or an unreadable
//! file is logged and skipped so the rest of the build can proceed.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A raw unit of input: a manuscript file's identifier and its full text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// The path of the file relative to the discovery root, always
    /// `/`-separated and including the extension (e.g.,
    /// `part1/01_introduction.md`). Manifest entries refer to files by this
    /// identifier.
    pub id: String,

    /// The file's contents.
    pub content: String,
}

impl SourceFile {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        SourceFile {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// Decides which files under the discovery root are manuscript files.
#[derive(Clone, Debug)]
pub struct MatchRule {
    /// File extension without the leading dot (e.g., `md`).
    pub extension: String,

    /// Whether to descend into subdirectories.
    pub recursive: bool,
}

impl Default for MatchRule {
    fn default() -> Self {
        MatchRule {
            extension: String::from("md"),
            recursive: true,
        }
    }
}

impl MatchRule {
    fn matches(&self, path: &Path) -> bool {
        path.extension().map_or(false, |ext| {
            ext.to_string_lossy() == self.extension.as_str()
        })
    }
}

/// Searches `root` for files matching `rule` and reads each into a
/// [`SourceFile`]. The result has no guaranteed order.
pub fn discover(root: &Path, rule: &MatchRule) -> Vec<SourceFile> {
    if !root.is_dir() {
        warn!(root = %root.display(), "manuscript directory not found");
        return Vec::new();
    }

    let walker = WalkDir::new(root).min_depth(1);
    let walker = match rule.recursive {
        true => walker,
        false => walker.max_depth(1),
    };

    let mut sources = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable manuscript entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !rule.matches(entry.path()) {
            continue;
        }

        // strip_prefix can't fail; every entry lives under `root`
        let relative = match entry.path().strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let id = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        match fs::read_to_string(entry.path()) {
            Ok(content) => {
                debug!(%id, "discovered source file");
                sources.push(SourceFile { id, content });
            }
            Err(err) => {
                warn!(%id, error = %err, "skipping unreadable source file")
            }
        }
    }

    if sources.is_empty() {
        warn!(
            root = %root.display(),
            extension = %rule.extension,
            "no manuscript files found"
        );
    }
    sources
}

#[cfg(test)]
mod test {
    use super::*;

    fn fixture() -> Vec<SourceFile> {
        discover(Path::new("./testdata/manuscript"), &MatchRule::default())
    }

    fn ids(mut sources: Vec<SourceFile>) -> Vec<String> {
        sources.sort_by(|a, b| a.id.cmp(&b.id));
        sources.into_iter().map(|s| s.id).collect()
    }

    #[test]
    fn test_discover_recursive() {
        let sources = fixture();
        assert_eq!(
            vec![
                "01_intro.md",
                "02_middle.md",
                "03_end.md",
                "appendix/01_glossary.md",
            ],
            ids(sources),
        );
    }

    #[test]
    fn test_discover_flat() {
        let rule = MatchRule {
            recursive: false,
            ..MatchRule::default()
        };
        let sources = discover(Path::new("./testdata/manuscript"), &rule);
        assert_eq!(
            vec!["01_intro.md", "02_middle.md", "03_end.md"],
            ids(sources)
        );
    }

    #[test]
    fn test_discover_reads_content() {
        let sources = fixture();
        let intro = sources.iter().find(|s| s.id == "01_intro.md").unwrap();
        assert!(intro.content.starts_with("# Intro\n"));
    }

    #[test]
    fn test_discover_missing_directory() {
        let sources = discover(
            Path::new("./testdata/does-not-exist"),
            &MatchRule::default(),
        );
        assert!(sources.is_empty());
    }

    #[test]
    fn test_discover_no_matches() {
        let rule = MatchRule {
            extension: String::from("adoc"),
            ..MatchRule::default()
        };
        assert!(discover(Path::new("./testdata/manuscript"), &rule).is_empty());
    }
}

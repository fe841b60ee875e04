//! Defines the [`OrderManifest`], the author-maintained list of source file
//! identifiers (one per line, e.g. a Leanpub `Book.txt`) that fixes the
//! canonical reading order.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// An ordered list of [`crate::source::SourceFile`] identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderManifest {
    entries: Vec<String>,
}

impl OrderManifest {
    /// Parses a manifest from text. Each line is trimmed and blank lines are
    /// ignored; all other lines are kept in file order, duplicates included.
    pub fn parse(text: &str) -> Self {
        OrderManifest {
            entries: text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    /// Reads the manifest at `path`. Returns `None` if the file doesn't exist
    /// or can't be read, leaving the caller to apply its missing-manifest
    /// policy.
    pub fn load(path: &Path) -> Option<Self> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let manifest = Self::parse(&text);
                debug!(
                    path = %path.display(),
                    entries = manifest.len(),
                    "loaded order manifest"
                );
                Some(manifest)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "order manifest not found");
                None
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "can't read order manifest"
                );
                None
            }
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for OrderManifest {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        OrderManifest {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_skips_blank_lines() {
        let manifest = OrderManifest::parse("b.md\n\n  a.md  \r\n\nb.md\n");
        assert_eq!(&["b.md", "a.md", "b.md"], manifest.entries());
    }

    #[test]
    fn test_parse_empty() {
        assert!(OrderManifest::parse("\n   \n").is_empty());
    }

    #[test]
    fn test_load_fixture() {
        let manifest =
            OrderManifest::load(Path::new("./testdata/manuscript/Book.txt"))
                .unwrap();
        assert_eq!(
            &["02_middle.md", "01_intro.md", "missing.md"],
            manifest.entries()
        );
    }

    #[test]
    fn test_load_missing() {
        let path = Path::new("./testdata/manuscript/Nope.txt");
        assert_eq!(None, OrderManifest::load(path));
    }
}

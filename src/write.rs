//! Writes pipeline output to disk for the theming layer to pick up: one HTML
//! fragment per [`ContentItem`] and a `chapters.yaml` index describing the
//! whole sequence.

use crate::item::ContentItem;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The file name of the chapter index written into the output directory.
pub const INDEX_FILE: &str = "chapters.yaml";

/// The file name of each item's HTML fragment, inside a directory named after
/// the item's URL.
pub const FRAGMENT_FILE: &str = "index.html";

/// Responsible for laying out [`ContentItem`]s on disk.
pub struct Writer<'a> {
    /// The directory everything is written into. It is removed and recreated
    /// on every [`Writer::write_items`] so stale chapters don't linger.
    pub output_directory: &'a Path,

    /// Directories that must survive the build, such as the project root
    /// and the manuscript. Writing is refused if `output_directory` is one
    /// of them or contains one of them.
    pub protected: &'a [&'a Path],
}

impl Writer<'_> {
    /// Returns the path of the HTML fragment for `item`. Empty, `.` and `..`
    /// URL segments are skipped so the fragment always lands inside
    /// `output_directory`.
    pub fn fragment_path(&self, item: &ContentItem) -> PathBuf {
        let mut path = self.output_directory.to_owned();
        path.extend(
            item.url
                .split('/')
                .filter(|segment| !matches!(*segment, "" | "." | "..")),
        );
        path.join(FRAGMENT_FILE)
    }

    /// Clears the output directory and writes every item's fragment followed
    /// by the index. Nothing is touched if the output directory is protected
    /// or if two items would be written to the same fragment.
    pub fn write_items(&self, items: &[ContentItem]) -> Result<()> {
        self.check_protected()?;
        let paths = self.fragment_paths(items)?;

        rmdir(self.output_directory)?;
        fs::create_dir_all(self.output_directory)?;

        for (item, path) in items.iter().zip(paths) {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(&path, &item.html).map_err(|err| Error::WriteFragment {
                path: path.clone(),
                err,
            })?;
            debug!(id = %item.id, path = %path.display(), "wrote fragment");
        }

        let index_path = self.output_directory.join(INDEX_FILE);
        write_index(items, File::create(&index_path)?)?;
        info!(
            items = items.len(),
            output = %self.output_directory.display(),
            "wrote chapters"
        );
        Ok(())
    }

    fn check_protected(&self) -> Result<()> {
        let output = match resolve(self.output_directory) {
            Some(output) => output,
            // nothing there yet, so nothing to lose
            None => return Ok(()),
        };
        for dir in self.protected {
            if let Some(resolved) = resolve(dir) {
                if resolved.starts_with(&output) {
                    return Err(Error::Protected {
                        output: self.output_directory.to_owned(),
                        protected: dir.to_path_buf(),
                    });
                }
            }
        }
        Ok(())
    }

    fn fragment_paths(&self, items: &[ContentItem]) -> Result<Vec<PathBuf>> {
        let mut seen: HashMap<PathBuf, &str> = HashMap::new();
        let mut paths = Vec::with_capacity(items.len());
        for item in items {
            let path = self.fragment_path(item);
            // a manifest may list the same chapter twice
            match seen.insert(path.clone(), &item.id) {
                Some(first) if first != item.id => {
                    return Err(Error::DuplicateUrl {
                        url: item.url.clone(),
                        first: first.to_owned(),
                        second: item.id.clone(),
                    })
                }
                _ => paths.push(path),
            }
        }
        Ok(paths)
    }
}

// Returns the absolute, symlink-free form of `dir`, or `None` if it doesn't
// exist.
fn resolve(dir: &Path) -> Option<PathBuf> {
    fs::canonicalize(dir).ok()
}

/// Serializes the ordered chapter index (everything but the HTML bodies) as
/// YAML into `w`.
pub fn write_index<W: io::Write>(items: &[ContentItem], w: W) -> Result<()> {
    serde_yaml::to_writer(w, items)?;
    Ok(())
}

fn rmdir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Clean {
            path: dir.to_owned(),
            err: e,
        }),
    }
}

/// The result of a fallible writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing output files.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while clearing the output directory.
    Clean { path: PathBuf, err: io::Error },

    /// Returned when the output directory is, or contains, a directory the
    /// build must not delete.
    Protected { output: PathBuf, protected: PathBuf },

    /// Returned when items from two different source files would be written
    /// to the same fragment.
    DuplicateUrl {
        url: String,
        first: String,
        second: String,
    },

    /// Returned for I/O problems writing an item's HTML fragment.
    WriteFragment { path: PathBuf, err: io::Error },

    /// Returned when the chapter index can't be serialized.
    Index(serde_yaml::Error),

    /// Returned for other I/O errors.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::Protected { output, protected } => write!(
                f,
                "Refusing to clear output directory '{}': it contains '{}'",
                output.display(),
                protected.display()
            ),
            Error::DuplicateUrl { url, first, second } => write!(
                f,
                "'{}' and '{}' both have the URL '{}'",
                first, second, url
            ),
            Error::WriteFragment { path, err } => {
                write!(f, "Writing fragment '{}': {}", path.display(), err)
            }
            Error::Index(err) => write!(f, "Writing chapter index: {}", err),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Clean { path: _, err } => Some(err),
            Error::Protected { .. } => None,
            Error::DuplicateUrl { .. } => None,
            Error::WriteFragment { path: _, err } => Some(err),
            Error::Index(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`].
    fn from(err: serde_yaml::Error) -> Error {
        Error::Index(err)
    }
}

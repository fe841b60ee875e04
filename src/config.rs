//! Loads a project's `quire.yaml` into a [`Config`]. Every key is optional;
//! see [`Project`] for the defaults.

use crate::markdown::CalloutMarkers;
use crate::order::{
    MissingManifestPolicy, OrderDirection, OrderingOptions, UnlistedPolicy,
};
use crate::pipeline::{PipelineOptions, DEFAULT_PREVIEW_LIMIT};
use crate::source::MatchRule;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "quire.yaml";

#[derive(Deserialize)]
struct PreviewLimit(usize);
impl Default for PreviewLimit {
    fn default() -> Self {
        PreviewLimit(DEFAULT_PREVIEW_LIMIT)
    }
}

#[derive(Deserialize)]
struct Extension(String);
impl Default for Extension {
    fn default() -> Self {
        Extension(String::from("md"))
    }
}

#[derive(Deserialize)]
struct Recursive(bool);
impl Default for Recursive {
    fn default() -> Self {
        Recursive(true)
    }
}

/// The contents of `quire.yaml`. Paths are relative to the file's directory.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    #[serde(default = "default_manuscript")]
    manuscript: PathBuf,

    /// Defaults to `{manuscript}/Book.txt`.
    #[serde(default)]
    manifest: Option<PathBuf>,

    #[serde(default)]
    extension: Extension,

    #[serde(default)]
    recursive: Recursive,

    #[serde(default)]
    preview_limit: PreviewLimit,

    #[serde(default)]
    callout_markers: CalloutMarkers,

    #[serde(default)]
    order_direction: OrderDirection,

    #[serde(default)]
    unlisted: UnlistedPolicy,

    #[serde(default)]
    missing_manifest: MissingManifestPolicy,

    #[serde(default)]
    dedupe: bool,
}

fn default_manuscript() -> PathBuf {
    PathBuf::from("manuscript")
}

/// Everything needed to run a build for one project.
#[derive(Clone, Debug)]
pub struct Config {
    /// The directory holding the project file.
    pub project_root: PathBuf,

    /// The directory searched for source files.
    pub manuscript_directory: PathBuf,

    /// The order manifest.
    pub manifest_path: PathBuf,

    pub callout_markers: CalloutMarkers,

    pub pipeline: PipelineOptions,
}

impl Config {
    /// Looks for [`PROJECT_FILE`] in `dir` and then in each of its ancestors,
    /// loading the first one found.
    pub fn from_directory(
        dir: &Path,
        threads: Option<usize>,
    ) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path, threads).with_context(
                    || format!("Loading configuration `{}`", path.display()),
                );
            }
            current = dir.parent();
        }
        Err(anyhow!(
            "Could not find `{}` in `{}` or any parent directory",
            PROJECT_FILE,
            dir.display()
        ))
    }

    /// Loads the project file at `path`. `threads` overrides the number of
    /// derivation workers, which otherwise defaults to the CPU count.
    pub fn from_project_file(
        path: &Path,
        threads: Option<usize>,
    ) -> Result<Config> {
        let file = File::open(path).with_context(|| {
            format!("Opening project file `{}`", path.display())
        })?;
        let project: Project = serde_yaml::from_reader(file)?;
        let project_root = match path.parent() {
            Some(parent) => parent.to_owned(),
            None => {
                return Err(anyhow!(
                    "Can't get parent directory for project file path '{:?}'",
                    path
                ))
            }
        };
        Ok(Config::from_project(project, project_root, threads))
    }

    fn from_project(
        project: Project,
        project_root: PathBuf,
        threads: Option<usize>,
    ) -> Config {
        let manuscript_directory = project_root.join(&project.manuscript);
        let manifest_path = match &project.manifest {
            Some(manifest) => project_root.join(manifest),
            None => manuscript_directory.join("Book.txt"),
        };
        Config {
            manuscript_directory,
            manifest_path,
            callout_markers: project.callout_markers,
            pipeline: PipelineOptions {
                rule: MatchRule {
                    extension: project
                        .extension
                        .0
                        .trim_start_matches('.')
                        .to_owned(),
                    recursive: project.recursive.0,
                },
                ordering: OrderingOptions {
                    direction: project.order_direction,
                    unlisted: project.unlisted,
                    missing_manifest: project.missing_manifest,
                    dedupe: project.dedupe,
                },
                preview_limit: project.preview_limit.0,
                threads: threads.unwrap_or_else(num_cpus::get),
            },
            project_root,
        }
    }
}

//! Fetch the docs subtree of a remote branch into the content directory.
//!
//! The subtree is exported with `git archive` into a scratch directory and
//! merged over the content directory from there, so the working tree and index
//! of the site repository are never touched. Files that only exist locally are
//! kept. A failed merge is not rolled back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::command::{self, CommandError, CommandSpec};

/// Configuration for the fetch stage.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Site repository root; relative paths below resolve against it
    pub project_root: PathBuf,

    /// Git remote to fetch from
    pub remote: String,

    /// Branch holding the up-to-date docs
    pub branch: String,

    /// Directory inside the branch that holds the docs
    pub subtree: String,

    /// Live content directory
    pub content_dir: PathBuf,

    /// Transient staging directory, removed when the stage ends
    pub scratch_dir: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            remote: "origin".to_string(),
            branch: "master".to_string(),
            subtree: "docs".to_string(),
            content_dir: PathBuf::from("docs"),
            scratch_dir: PathBuf::from("temp_docs"),
        }
    }
}

impl FetchConfig {
    /// Remote-tracking ref the docs are exported from, e.g. `origin/master`.
    pub fn reference(&self) -> String {
        format!("{}/{}", self.remote, self.branch)
    }
}

/// Result of a fetch.
#[derive(Debug)]
pub struct FetchSummary {
    /// Files copied into the content directory
    pub files: usize,

    /// Content directory that received them
    pub content_dir: PathBuf,
}

/// Errors that can occur while fetching docs.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("{reference} has no {subtree}/ directory")]
    MissingSubtree { reference: String, subtree: String },

    #[error("Failed to prepare scratch directory {path}: {source}")]
    Scratch { path: String, source: io::Error },

    #[error("Failed to merge {path}: {source}")]
    Merge { path: String, source: io::Error },
}

/// A staging directory that is removed when dropped.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create `path` empty, clearing anything left by an earlier run.
    pub fn create(path: PathBuf) -> Result<Self, FetchError> {
        let scratch_error = |source| FetchError::Scratch {
            path: path.display().to_string(),
            source,
        };

        if path.exists() {
            fs::remove_dir_all(&path).map_err(scratch_error)?;
        }
        fs::create_dir_all(&path).map_err(scratch_error)?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// Fetch the docs subtree from the configured branch and merge it into the
/// content directory.
pub async fn fetch_docs(config: &FetchConfig) -> Result<FetchSummary, FetchError> {
    let root = config.project_root.as_path();
    let reference = config.reference();

    let scratch = ScratchDir::create(root.join(&config.scratch_dir))?;
    tracing::info!("Staging docs in {}", scratch.path().display());

    let fetch = CommandSpec::new("git", ["fetch", config.remote.as_str(), config.branch.as_str()]);
    command::run(&fetch, root, None).await?;
    tracing::info!("Fetched {}", reference);

    let archive = CommandSpec::new(
        "git",
        ["archive".to_string(), reference.clone(), format!("{}/", config.subtree)],
    );
    let tarball = command::run(&archive, root, None).await?.stdout;

    let unpack = CommandSpec::new("tar", ["-x", "-f", "-"]);
    command::run(&unpack, scratch.path(), Some(tarball.as_slice())).await?;
    tracing::info!("Downloaded {}/ from {}", config.subtree, reference);

    let staged = scratch.path().join(&config.subtree);
    if !staged.is_dir() {
        return Err(FetchError::MissingSubtree {
            reference,
            subtree: config.subtree.clone(),
        });
    }

    let content_dir = root.join(&config.content_dir);
    let files = merge_tree(&staged, &content_dir)?;
    tracing::info!("Copied {} files to {}", files, content_dir.display());

    Ok(FetchSummary { files, content_dir })
}

/// Copy every file under `from` to the same relative path under `to`.
///
/// Existing files are overwritten; files that only exist under `to` are left
/// alone. Returns the number of files copied.
pub fn merge_tree(from: &Path, to: &Path) -> Result<usize, FetchError> {
    let mut copied = 0;

    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|e| FetchError::Merge {
            path: from.display().to_string(),
            source: e.into(),
        })?;

        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let target = to.join(relative);
        let merge_error = |source| FetchError::Merge {
            path: target.display().to_string(),
            source,
        };

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(merge_error)?;
        } else {
            fs::copy(entry.path(), &target).map_err(merge_error)?;
            tracing::debug!("Copied {}", relative.display());
            copied += 1;
        }
    }

    Ok(copied)
}

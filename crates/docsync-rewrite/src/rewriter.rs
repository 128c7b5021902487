//! Apply the rewrite rules to a content directory.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::rules::RuleSet;

/// Whether rewritten files are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Write changed files back to disk
    #[default]
    Write,
    /// Only report which files would change
    Check,
}

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Content changed (and was written, in [`Mode::Write`])
    Changed,
    /// Rules produced identical content
    Unchanged,
}

/// A failure on one file. Sibling files are still processed.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Errors that stop the rewriter before any file is touched.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("Content directory not found: {0}")]
    ContentDirNotFound(String),

    #[error("No markdown files found in {0}")]
    NoMarkdownFiles(String),
}

/// Aggregate result of rewriting a content directory.
#[derive(Debug, Default)]
pub struct RewriteSummary {
    /// Markdown files discovered
    pub total: usize,

    /// Files whose content changed
    pub changed: Vec<PathBuf>,

    /// Files left as they were
    pub unchanged: usize,

    /// Files that could not be read or written
    pub failures: Vec<FileError>,
}

impl RewriteSummary {
    /// Files processed without an I/O error, changed or not.
    pub fn processed(&self) -> usize {
        self.total - self.failures.len()
    }

    /// True when every file was processed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Rewrites markdown files in place.
#[derive(Debug, Clone, Copy)]
pub struct Rewriter {
    rules: &'static RuleSet,
    mode: Mode,
}

impl Rewriter {
    /// Create a rewriter using the Docusaurus rules.
    pub fn new(mode: Mode) -> Self {
        Self {
            rules: RuleSet::docusaurus(),
            mode,
        }
    }

    /// Rewrite every markdown file under `content_dir`.
    pub fn rewrite_tree(&self, content_dir: &Path) -> Result<RewriteSummary, RewriteError> {
        if !content_dir.is_dir() {
            return Err(RewriteError::ContentDirNotFound(
                content_dir.display().to_string(),
            ));
        }

        let Discovery { files, errors } = discover_markdown(content_dir);
        if files.is_empty() && errors.is_empty() {
            return Err(RewriteError::NoMarkdownFiles(
                content_dir.display().to_string(),
            ));
        }

        tracing::info!("Found {} markdown files", files.len());
        for e in &errors {
            tracing::error!("{}", e);
        }

        let mut summary = RewriteSummary {
            total: files.len() + errors.len(),
            failures: errors,
            ..Default::default()
        };

        for path in files {
            match self.rewrite_file(&path) {
                Ok(FileOutcome::Changed) => summary.changed.push(path),
                Ok(FileOutcome::Unchanged) => summary.unchanged += 1,
                Err(e) => {
                    tracing::error!("{}", e);
                    summary.failures.push(e);
                }
            }
        }

        tracing::info!("Processed {}/{} files", summary.processed(), summary.total);

        Ok(summary)
    }

    /// Rewrite a single file, writing it back only if the rules changed it.
    pub fn rewrite_file(&self, path: &Path) -> Result<FileOutcome, FileError> {
        tracing::debug!("Processing {}", path.display());

        let raw = fs::read_to_string(path).map_err(|source| FileError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let original = normalize_line_endings(&raw);
        let fixed = self.rules.apply(&original);

        if fixed == original {
            tracing::debug!("No changes: {}", path.display());
            return Ok(FileOutcome::Unchanged);
        }

        match self.mode {
            Mode::Write => {
                fs::write(path, &fixed).map_err(|source| FileError::Write {
                    path: path.display().to_string(),
                    source,
                })?;
                tracing::info!("Fixed: {}", path.display());
            }
            Mode::Check => tracing::info!("Would fix: {}", path.display()),
        }

        Ok(FileOutcome::Changed)
    }
}

/// Markdown files under a content directory, plus the entries that could not
/// be walked.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub errors: Vec<FileError>,
}

/// Collect `*.md` files under `dir`, sorted, skipping hidden entries.
///
/// Dangling links, link loops and unreadable directories are reported as
/// read errors unless the entry cannot be markdown (`logo.png`).
pub fn discover_markdown(dir: &Path) -> Discovery {
    let mut found = Discovery::default();

    let walker = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_markdown(entry.path()) {
                    found.files.push(entry.into_path());
                }
            }
            Err(e) if e.path().map_or(true, may_hold_markdown) => {
                let path = e.path().unwrap_or(dir).display().to_string();
                found.errors.push(FileError::Read {
                    path,
                    source: e.into(),
                });
            }
            Err(e) => tracing::debug!("Skipping {}", e),
        }
    }

    found
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("md")
}

/// Directories and `*.md` entries; hidden ones are never visited.
fn may_hold_markdown(path: &Path) -> bool {
    !is_hidden(path) && (path.extension().is_none() || is_markdown(path))
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn fixes_docs_tree_end_to_end() {
        let temp = tempdir().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir_all(docs.join("guides")).unwrap();

        fs::write(
            docs.join("guides/setup.md"),
            "# Setup\n<!-- draft: add screenshots -->\nSee [config](./configuring.md).\n\n\n\n\nDone.\n",
        )
        .unwrap();
        fs::write(docs.join("clean.md"), "# Clean\n\nNothing to do.\n").unwrap();

        let summary = Rewriter::new(Mode::Write).rewrite_tree(&docs).unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.processed(), 2);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.changed, vec![docs.join("guides/setup.md")]);
        assert!(summary.is_success());

        let fixed = fs::read_to_string(docs.join("guides/setup.md")).unwrap();
        assert_eq!(
            fixed,
            "# Setup\n\nSee [config](/docs/configuring).\n\nDone.\n"
        );
    }

    #[test]
    fn second_run_changes_nothing() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("index.md"),
            "<p align=\"center\">\n  <img src=\"logo.png\">\n</p>\n\n[Next](next.md)",
        )
        .unwrap();

        let rewriter = Rewriter::new(Mode::Write);
        let first = rewriter.rewrite_tree(temp.path()).unwrap();
        let second = rewriter.rewrite_tree(temp.path()).unwrap();

        assert_eq!(first.changed.len(), 1);
        assert!(second.changed.is_empty());
        assert_eq!(second.unchanged, 1);
    }

    #[test]
    fn check_mode_does_not_write() {
        let temp = tempdir().unwrap();
        let page = temp.path().join("page.md");
        let source = "Line<br>break";
        fs::write(&page, source).unwrap();

        let summary = Rewriter::new(Mode::Check).rewrite_tree(temp.path()).unwrap();

        assert_eq!(summary.changed, vec![page.clone()]);
        assert_eq!(fs::read_to_string(&page).unwrap(), source);
    }

    #[test]
    fn crlf_only_file_is_left_alone() {
        let temp = tempdir().unwrap();
        let page = temp.path().join("page.md");
        fs::write(&page, "# Title\r\n\r\nBody\r\n").unwrap();

        let outcome = Rewriter::new(Mode::Write).rewrite_file(&page).unwrap();

        assert_eq!(outcome, FileOutcome::Unchanged);
        assert_eq!(fs::read_to_string(&page).unwrap(), "# Title\r\n\r\nBody\r\n");
    }

    #[test]
    fn unreadable_file_fails_without_stopping_siblings() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.md"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(temp.path().join("b.md"), "Line<br>break").unwrap();

        let summary = Rewriter::new(Mode::Write).rewrite_tree(temp.path()).unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.processed(), 1);
        assert!(!summary.is_success());
        assert!(matches!(summary.failures[0], FileError::Read { .. }));
        assert_eq!(
            fs::read_to_string(temp.path().join("b.md")).unwrap(),
            "Line<br />break\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn dangling_markdown_link_is_a_failure() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.md"), "Line<br>break").unwrap();
        symlink(temp.path().join("gone.md"), temp.path().join("b.md")).unwrap();
        symlink(temp.path().join("gone.png"), temp.path().join("logo.png")).unwrap();

        let summary = Rewriter::new(Mode::Write).rewrite_tree(temp.path()).unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.processed(), 1);
        assert!(!summary.is_success());
        assert!(matches!(
            &summary.failures[0],
            FileError::Read { path, .. } if path.ends_with("b.md")
        ));
        assert_eq!(
            fs::read_to_string(temp.path().join("a.md")).unwrap(),
            "Line<br />break\n"
        );
    }

    // procfs refuses writes to cmdline even for root.
    #[cfg(target_os = "linux")]
    #[test]
    fn unwritable_file_fails_without_stopping_siblings() {
        let temp = tempdir().unwrap();
        std::os::unix::fs::symlink("/proc/self/cmdline", temp.path().join("a.md")).unwrap();
        fs::write(temp.path().join("b.md"), "Line<br>break").unwrap();

        let summary = Rewriter::new(Mode::Write).rewrite_tree(temp.path()).unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.processed(), 1);
        assert!(!summary.is_success());
        assert!(matches!(summary.failures[0], FileError::Write { .. }));
        assert_eq!(
            fs::read_to_string(temp.path().join("b.md")).unwrap(),
            "Line<br />break\n"
        );
    }

    #[test]
    fn skips_hidden_and_non_markdown_files() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join(".cache")).unwrap();
        fs::write(temp.path().join(".cache/stale.md"), "x").unwrap();
        fs::write(temp.path().join("logo.png"), "x").unwrap();
        fs::write(temp.path().join("page.mdx"), "x").unwrap();
        fs::write(temp.path().join("b.md"), "x").unwrap();
        fs::write(temp.path().join("a.md"), "x").unwrap();

        let files = discover_markdown(temp.path()).files;

        assert_eq!(
            files,
            vec![temp.path().join("a.md"), temp.path().join("b.md")]
        );
    }

    #[test]
    fn errors_on_missing_content_dir() {
        let temp = tempdir().unwrap();

        let result = Rewriter::new(Mode::Write).rewrite_tree(&temp.path().join("docs"));

        assert!(matches!(result, Err(RewriteError::ContentDirNotFound(_))));
    }

    #[test]
    fn errors_when_no_markdown_found() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("notes.txt"), "x").unwrap();

        let result = Rewriter::new(Mode::Write).rewrite_tree(temp.path());

        assert!(matches!(result, Err(RewriteError::NoMarkdownFiles(_))));
    }
}

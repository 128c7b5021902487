//! Markdown fix command.

use std::path::Path;

use anyhow::{bail, Result};
use docsync_rewrite::{Mode, Rewriter};

/// Run the fix command. With `check`, nothing is written and any file that
/// would change is an error.
pub fn run(content_dir: &Path, check: bool) -> Result<()> {
    let mode = if check { Mode::Check } else { Mode::Write };

    let summary = Rewriter::new(mode).rewrite_tree(content_dir)?;

    if !summary.is_success() {
        bail!(
            "{} of {} files could not be processed",
            summary.failures.len(),
            summary.total
        );
    }

    if check && !summary.changed.is_empty() {
        bail!(
            "{} of {} files need fixing, run `docsync fix`",
            summary.changed.len(),
            summary.total
        );
    }

    tracing::info!(
        "{} files fixed, {} unchanged",
        summary.changed.len(),
        summary.unchanged
    );

    Ok(())
}

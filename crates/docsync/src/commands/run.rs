//! Full pipeline: fetch, fix, verify.

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;

/// Run every stage in order, stopping at the first failure.
pub async fn run(root: &Path, config: &Config) -> Result<()> {
    tracing::info!("Updating documentation in {}", root.display());

    // Resolve every stage's settings up front so a bad config fails early.
    let fetch = config.fetch_config(root);
    let verify = config.verify_config(root)?;

    tracing::info!("Stage 1/3: download docs");
    super::fetch::run(&fetch)
        .await
        .context("Failed: download docs")?;

    tracing::info!("Stage 2/3: process markdown");
    super::fix::run(&config.content_dir(root), false).context("Failed: process markdown")?;

    tracing::info!("Stage 3/3: test build");
    super::verify::run(&verify)
        .await
        .context("Failed: test build")?;

    tracing::info!("Documentation updated successfully!");

    Ok(())
}

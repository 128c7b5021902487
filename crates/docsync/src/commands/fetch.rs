//! Fetch command.

use anyhow::{Context, Result};
use docsync_pipeline::{fetch_docs, FetchConfig};

/// Run the fetch command.
pub async fn run(config: &FetchConfig) -> Result<()> {
    tracing::info!("Fetching {}/ from {}", config.subtree, config.reference());

    let summary = fetch_docs(config)
        .await
        .context("Failed to download docs")?;

    tracing::info!(
        "Merged {} files into {}",
        summary.files,
        summary.content_dir.display()
    );

    Ok(())
}

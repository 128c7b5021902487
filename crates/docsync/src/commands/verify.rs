//! Build verification command.

use anyhow::Result;
use docsync_pipeline::{verify_build, VerifyConfig};

/// Run the verify command.
pub async fn run(config: &VerifyConfig) -> Result<()> {
    tracing::info!("Testing build...");

    let report = verify_build(config).await?;

    if report.clean_exit {
        tracing::info!("Build generated static files");
    } else {
        tracing::info!("Build generated static files despite a non-zero exit");
    }

    Ok(())
}

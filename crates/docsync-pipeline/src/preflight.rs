//! Project root check.

use std::path::Path;

/// Files that mark a Docusaurus project root.
pub const DEFAULT_MARKERS: [&str; 2] = ["package.json", "docusaurus.config.js"];

#[derive(Debug, thiserror::Error)]
pub enum PreflightError {
    #[error("{marker} not found in {root} - run from the site project root")]
    MissingMarker { marker: String, root: String },
}

/// Ensure every marker file exists in `root` before anything touches the disk.
pub fn check_project_root<S: AsRef<str>>(root: &Path, markers: &[S]) -> Result<(), PreflightError> {
    for marker in markers {
        let marker = marker.as_ref();
        if !root.join(marker).exists() {
            return Err(PreflightError::MissingMarker {
                marker: marker.to_string(),
                root: root.display().to_string(),
            });
        }
    }

    tracing::debug!("Project root {} looks like a site", root.display());
    Ok(())
}

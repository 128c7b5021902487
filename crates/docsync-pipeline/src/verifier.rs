//! Build verification.
//!
//! Docusaurus sometimes exits non-zero on warnings after it has finished
//! generating the site, so the exit code is not trusted. A build succeeded if
//! and only if its standard output contains the success marker.

use std::path::{Path, PathBuf};

use crate::command::{self, CommandError, CommandOutput, CommandSpec};

/// Printed by Docusaurus once the static files are written.
pub const SUCCESS_MARKER: &str = "Generated static files";

/// Configuration for the verify stage.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Site project root, used as working directory
    pub project_root: PathBuf,

    /// Site build command
    pub build: CommandSpec,

    /// Best-effort command that stops a running dev server
    pub stop_dev_server: Option<CommandSpec>,

    /// Substring of stdout that signals a completed build
    pub success_marker: String,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            build: CommandSpec::new("npm", ["run", "build"]),
            stop_dev_server: Some(CommandSpec::new("pkill", ["-f", "docusaurus start"])),
            success_marker: SUCCESS_MARKER.to_string(),
        }
    }
}

/// Classification of a finished build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The marker was printed
    Generated,
    /// No marker on stdout
    Failed,
}

/// Details of a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Exit code of the build command
    pub code: Option<i32>,

    /// Whether the build also exited with status zero
    pub clean_exit: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Build failed: \"{marker}\" not found in output (exit {status})\n{stderr}")]
    MarkerMissing {
        marker: String,
        status: String,
        stderr: String,
    },
}

/// Decide whether a build succeeded, looking only at its stdout.
pub fn classify(output: &CommandOutput, marker: &str) -> BuildOutcome {
    if output.stdout_text().contains(marker) {
        BuildOutcome::Generated
    } else {
        BuildOutcome::Failed
    }
}

/// Stop a dev server that could hold the port. Failures are ignored.
pub async fn stop_dev_server(spec: &CommandSpec, cwd: &Path) {
    match command::capture(spec, cwd, None).await {
        Ok(output) if output.success => tracing::info!("Stopped dev server"),
        Ok(output) => tracing::debug!(
            "`{}` exited with {}, assuming no dev server",
            spec,
            output.status_label()
        ),
        Err(e) => tracing::debug!("Could not stop dev server: {}", e),
    }
}

/// Run the site build and check it generated output.
pub async fn verify_build(config: &VerifyConfig) -> Result<BuildReport, VerifyError> {
    let root = config.project_root.as_path();

    if let Some(stop) = &config.stop_dev_server {
        stop_dev_server(stop, root).await;
    }

    tracing::info!("Running `{}`", config.build);
    let output = command::capture(&config.build, root, None).await?;

    match classify(&output, &config.success_marker) {
        BuildOutcome::Generated => {
            if !output.success {
                tracing::warn!(
                    "Build exited with {} but reported \"{}\"",
                    output.status_label(),
                    config.success_marker
                );
            }
            tracing::info!("Build successful");
            Ok(BuildReport {
                code: output.code,
                clean_exit: output.success,
            })
        }
        BuildOutcome::Failed => Err(VerifyError::MarkerMissing {
            marker: config.success_marker.clone(),
            status: output.status_label(),
            stderr: output.stderr_text().trim().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn output(code: i32, stdout: &str) -> CommandOutput {
        CommandOutput {
            code: Some(code),
            success: code == 0,
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        }
    }

    #[test]
    fn marker_wins_over_exit_code() {
        let noisy = output(1, "[WARNING] ...\n[SUCCESS] Generated static files in \"build\".\n");
        let quiet = output(0, "Compiled with warnings.\n");

        assert_eq!(classify(&noisy, SUCCESS_MARKER), BuildOutcome::Generated);
        assert_eq!(classify(&quiet, SUCCESS_MARKER), BuildOutcome::Failed);
    }

    #[test]
    fn marker_on_stderr_does_not_count() {
        let mut out = output(0, "");
        out.stderr = SUCCESS_MARKER.as_bytes().to_vec();

        assert_eq!(classify(&out, SUCCESS_MARKER), BuildOutcome::Failed);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn accepts_marker_despite_failing_exit() {
        let temp = tempdir().unwrap();
        let config = VerifyConfig {
            project_root: temp.path().to_path_buf(),
            build: CommandSpec::new("sh", ["-c", "echo 'Generated static files in build.'; exit 1"]),
            stop_dev_server: Some(CommandSpec::new("docsync-no-such-program", Vec::<String>::new())),
            ..Default::default()
        };

        let report = verify_build(&config).await.unwrap();

        assert_eq!(report.code, Some(1));
        assert!(!report.clean_exit);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn surfaces_stderr_when_marker_missing() {
        let temp = tempdir().unwrap();
        let config = VerifyConfig {
            project_root: temp.path().to_path_buf(),
            build: CommandSpec::new("sh", ["-c", "echo done; echo 'broken link' >&2"]),
            stop_dev_server: None,
            ..Default::default()
        };

        let err = verify_build(&config).await.unwrap_err();

        match err {
            VerifyError::MarkerMissing { status, stderr, .. } => {
                assert_eq!(status, "0");
                assert_eq!(stderr, "broken link");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_build_tool_is_an_error() {
        let temp = tempdir().unwrap();
        let config = VerifyConfig {
            project_root: temp.path().to_path_buf(),
            build: CommandSpec::new("docsync-no-such-program", ["build"]),
            stop_dev_server: None,
            ..Default::default()
        };

        let result = verify_build(&config).await;

        assert!(matches!(result, Err(VerifyError::Command(_))));
    }
}

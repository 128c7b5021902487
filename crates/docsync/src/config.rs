//! Configuration file (docsync.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use docsync_pipeline::{
    check_project_root, CommandSpec, FetchConfig, VerifyConfig, DEFAULT_MARKERS, SUCCESS_MARKER,
};
use serde::Deserialize;

/// Configuration file structure. Every section is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub site: SiteConfig,
    pub build: BuildSettings,
}

/// Where the upstream docs live.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub remote: String,
    pub branch: String,
    /// Docs directory inside the upstream branch
    pub subtree: String,
}

/// Layout of the site project.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub content_dir: PathBuf,
    pub scratch_dir: PathBuf,
    /// Files that must exist in the project root
    pub markers: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub command: Vec<String>,
    /// Empty to skip stopping the dev server
    pub stop_command: Vec<String>,
    pub success_marker: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            branch: "master".to_string(),
            subtree: "docs".to_string(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("docs"),
            scratch_dir: PathBuf::from("temp_docs"),
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            command: vec!["npm".to_string(), "run".to_string(), "build".to_string()],
            stop_command: vec![
                "pkill".to_string(),
                "-f".to_string(),
                "docusaurus start".to_string(),
            ],
            success_marker: SUCCESS_MARKER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path` if it exists.
    /// Returns an error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());

        Ok(config)
    }

    /// Load `file` from the project root and check the root has the configured
    /// marker files.
    ///
    /// If the file cannot be loaded, a root missing one of the default markers
    /// is reported ahead of the load error.
    pub fn load_for_root(root: &Path, file: &Path) -> Result<Self> {
        let config = match Self::load(&root.join(file)) {
            Ok(config) => config,
            Err(e) => {
                check_project_root(root, &DEFAULT_MARKERS)?;
                return Err(e);
            }
        };
        check_project_root(root, &config.site.markers)?;

        Ok(config)
    }

    /// Apply `--remote` / `--branch` overrides from the command line.
    pub fn override_source(&mut self, remote: Option<String>, branch: Option<String>) {
        if let Some(remote) = remote {
            self.source.remote = remote;
        }
        if let Some(branch) = branch {
            self.source.branch = branch;
        }
    }

    /// Content directory resolved against the project root.
    pub fn content_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.site.content_dir)
    }

    pub fn fetch_config(&self, root: &Path) -> FetchConfig {
        FetchConfig {
            project_root: root.to_path_buf(),
            remote: self.source.remote.clone(),
            branch: self.source.branch.clone(),
            subtree: self.source.subtree.clone(),
            content_dir: self.site.content_dir.clone(),
            scratch_dir: self.site.scratch_dir.clone(),
        }
    }

    pub fn verify_config(&self, root: &Path) -> Result<VerifyConfig> {
        let build = CommandSpec::from_argv(&self.build.command).context("Invalid build.command")?;
        let stop_dev_server = if self.build.stop_command.is_empty() {
            None
        } else {
            Some(CommandSpec::from_argv(&self.build.stop_command)?)
        };

        Ok(VerifyConfig {
            project_root: root.to_path_buf(),
            build,
            stop_dev_server,
            success_marker: self.build.success_marker.clone(),
        })
    }
}

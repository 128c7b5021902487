//! docsync CLI - pull upstream docs into a Docusaurus site, fix them, and
//! check the site still builds.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "docsync")]
#[command(about = "Sync upstream docs into a Docusaurus site and check it still builds")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Site project root
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Path to docsync.toml, relative to the project root
    #[arg(short, long, default_value = "docsync.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, fix and verify (the default)
    Run {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Download the latest docs from the upstream branch
    Fetch {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Apply Docusaurus compatibility fixes to the content directory
    Fix {
        /// Report files that need fixing without writing them
        #[arg(long)]
        check: bool,
    },

    /// Build the site and check it generated static files
    Verify,
}

#[derive(Args, Default)]
struct SourceArgs {
    /// Git remote to fetch from
    #[arg(long)]
    remote: Option<String>,

    /// Branch holding the docs
    #[arg(long)]
    branch: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let mut config = Config::load_for_root(&cli.root, &cli.config)?;

    let command = cli.command.unwrap_or(Commands::Run {
        source: SourceArgs::default(),
    });

    // Execute command
    match command {
        Commands::Run { source } => {
            config.override_source(source.remote, source.branch);
            commands::run::run(&cli.root, &config).await?;
        }
        Commands::Fetch { source } => {
            config.override_source(source.remote, source.branch);
            commands::fetch::run(&config.fetch_config(&cli.root)).await?;
        }
        Commands::Fix { check } => {
            commands::fix::run(&config.content_dir(&cli.root), check)?;
        }
        Commands::Verify => {
            commands::verify::run(&config.verify_config(&cli.root)?).await?;
        }
    }

    Ok(())
}

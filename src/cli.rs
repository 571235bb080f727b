use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::Config;
use crate::core::reporters::{ConsoleReporter, RemoteReporter, Reporter};
use crate::core::{AnalyzeOptions, Engine, SourceTree};

#[derive(Parser)]
#[command(name = "steptrace")]
#[command(about = "Call graphs of cucumber step definitions in Java projects")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a project and report the invocation tree of every step
    Analyze(AnalyzeArgs),

    /// Write a default configuration file
    Init {
        /// Target file (defaults to ./steptrace.toml)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct AnalyzeArgs {
    /// Simple names of the types to analyze; all types when empty
    pub filter: Vec<String>,

    /// Project root to walk for Java sources
    #[arg(long)]
    pub root: Option<PathBuf>,

    #[arg(long)]
    pub project_name: Option<String>,

    #[arg(long)]
    pub project_version: Option<String>,

    /// Java language level, e.g. JAVA_11 or 1.8
    #[arg(long)]
    pub language_level: Option<String>,

    /// Base URL of the remote report service
    #[arg(long, env = "STEPTRACE_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Print the invocation trees to stdout
    #[arg(long, env = "STEPTRACE_REPORT_TO_CONSOLE")]
    pub console: bool,
}

impl AnalyzeArgs {
    /// Command line flags take precedence over the configuration file
    pub fn apply(self, config: &mut Config) {
        if !self.filter.is_empty() {
            config.analysis.filter = self.filter;
        }
        if let Some(root) = self.root {
            config.project.root = root;
        }
        if let Some(name) = self.project_name {
            config.project.name = name;
        }
        if let Some(version) = self.project_version {
            config.project.version = version;
        }
        if let Some(level) = self.language_level {
            config.analysis.language_level = level;
        }
        if self.remote_url.is_some() {
            config.reporters.remote_url = self.remote_url;
        }
        if self.console {
            config.reporters.console = true;
        }
    }
}

/// Reporters selected by the configuration, console first
pub fn reporters_for(config: &Config) -> crate::error::Result<Vec<Box<dyn Reporter>>> {
    let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();
    let remote_url = config.remote_url();

    if config.reporters.console || remote_url.is_none() {
        reporters.push(Box::new(ConsoleReporter::new()));
    }

    match remote_url {
        Some(url) => reporters.push(Box::new(RemoteReporter::new(url)?)),
        None => warn!("⚠️  No remote URL configured, no remote reporting will occur"),
    }

    Ok(reporters)
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Analyze(args) => {
                let mut config = Config::load_or_default(self.config.as_ref())
                    .context("failed to load configuration")?;
                args.apply(&mut config);

                let options = AnalyzeOptions::from_config(&config)?;
                let file_index = Box::new(SourceTree::new(options.root.clone()));
                let reporters = reporters_for(&config)?;

                let engine = Engine::new(options, file_index, reporters)?;
                engine.run().await?;
                Ok(())
            }
            Commands::Init { path, force } => {
                let path = path.or(self.config).unwrap_or_else(|| PathBuf::from("steptrace.toml"));
                if path.exists() && !force {
                    anyhow::bail!("{} already exists, pass --force to overwrite", path.display());
                }

                Config::default()
                    .save(&path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!("✅ Wrote default configuration to {}", path.display());
                Ok(())
            }
        }
    }
}

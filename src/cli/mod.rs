//! Command-line interface for verctrl.
//!
//! Every subcommand lives in its own module with an `Args` struct and a `run`
//! function. The library returns structured results; only this layer prints.

use crate::config::{Configuration, DEFAULT_CONFIG_FILE};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

pub mod add;
pub mod backup;
pub mod init;
pub mod list;
pub mod restore;
pub mod stats;
pub mod track;

/// verctrl - lightweight file versioning with smart file detection
#[derive(Parser)]
#[command(name = "verctrl")]
#[command(about = "Lightweight file versioning with smart file detection")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Path to the config file; its directory is the project root
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create a default config file
    Init(init::InitArgs),
    /// Detect files with a strategy and add them to tracking
    Add(add::AddArgs),
    /// Track the given files
    Track(track::TrackArgs),
    /// Stop tracking the given files
    Untrack(track::TrackArgs),
    /// Back up every tracked file
    #[command(alias = "backup")]
    New(backup::NewArgs),
    /// List backups, newest first
    List(list::ListArgs),
    /// Restore a backup over its original file
    Restore(restore::RestoreArgs),
    /// Show statistics about tracked files and backups
    Stats(stats::StatsArgs),
}

/// Config file location and the project root derived from it
#[derive(Debug, Clone)]
pub struct Project {
    pub config_path: PathBuf,
    pub root: PathBuf,
}

impl Project {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Self {
        let config_path = config_path.as_ref().to_path_buf();
        let parent = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let root = fs::canonicalize(parent).unwrap_or_else(|_| parent.to_path_buf());

        Self { config_path, root }
    }

    pub fn load(&self) -> Result<Configuration> {
        Configuration::load(&self.config_path).with_context(|| {
            format!(
                "Could not load {} (run 'verctrl init' to create one)",
                self.config_path.display()
            )
        })
    }

    /// Load the config, writing a default one first if none exists
    pub fn load_or_init(&self) -> Result<Configuration> {
        if !self.config_path.exists() {
            println!("Config file not found, creating {}", self.config_path.display());
            self.save(&Configuration::default())?;
        }
        self.load()
    }

    pub fn save(&self, config: &Configuration) -> Result<()> {
        config
            .save(&self.config_path)
            .with_context(|| format!("Failed to write {}", self.config_path.display()))
    }

    /// Config file path as seen from the project root
    pub fn config_relative(&self) -> PathBuf {
        self.config_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let project = Project::new(&cli.config);

    match cli.command {
        Commands::Init(args) => init::run(args, &project),
        Commands::Add(args) => add::run(args, &project),
        Commands::Track(args) => track::run_track(args, &project),
        Commands::Untrack(args) => track::run_untrack(args, &project),
        Commands::New(args) => backup::run(args, &project),
        Commands::List(args) => list::run(args, &project),
        Commands::Restore(args) => restore::run(args, &project),
        Commands::Stats(args) => stats::run(args, &project),
    }
}

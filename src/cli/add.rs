//! Add command implementation.

use super::Project;
use crate::detect::{self, DiscoverOptions, Strategy};
use crate::ignore::read_ignore_file;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Paths echoed before the list is abbreviated
const PREVIEW_LIMIT: usize = 20;

/// Arguments for the add command
#[derive(Args)]
pub struct AddArgs {
    /// Detection strategy
    #[arg(value_enum)]
    pub strategy: Strategy,

    /// Age limit in days for the recent strategy
    #[arg(long, default_value_t = 30, allow_negative_numbers = true)]
    pub days: i64,

    /// Show what would be added without saving the config
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the add command
pub fn run(args: AddArgs, project: &Project) -> Result<()> {
    let mut config = project.load_or_init()?;

    let options = DiscoverOptions {
        days: args.days,
        ignore_lines: read_ignore_file(project.root.join(".gitignore")),
        exclude: vec![config.backup_dir.clone(), project.config_relative()],
    };

    println!("Detecting files using '{}' strategy...", args.strategy);
    let found = detect::discover(&project.root, args.strategy, &options)
        .with_context(|| format!("Detection with '{}' failed", args.strategy))?;

    if found.is_empty() {
        println!("No files found.");
        return Ok(());
    }

    print_preview(&found);

    if args.dry_run {
        println!();
        println!("Dry run, config not modified.");
        return Ok(());
    }

    let added = config.add_files(&found);
    project.save(&config)?;

    println!();
    println!("Added {} new file(s) to tracking", added);
    println!("Total tracked files: {}", config.files.len());
    Ok(())
}

fn print_preview(found: &[PathBuf]) {
    println!();
    println!("Found {} file(s):", found.len());
    for path in found.iter().take(PREVIEW_LIMIT) {
        println!("  {}", path.display());
    }
    if found.len() > PREVIEW_LIMIT {
        println!("  ... and {} more", found.len() - PREVIEW_LIMIT);
    }
}

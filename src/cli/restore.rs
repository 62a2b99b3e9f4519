//! Restore command implementation.

use super::Project;
use crate::backup::BackupEngine;
use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the restore command
#[derive(Args)]
pub struct RestoreArgs {
    /// Backup file name as shown by `verctrl list`
    pub backup: String,

    /// Restore to this path instead of the tracked file
    #[arg(long)]
    pub to: Option<PathBuf>,

    /// Overwrite an existing target
    #[arg(long)]
    pub force: bool,
}

/// Run the restore command
pub fn run(args: RestoreArgs, project: &Project) -> Result<()> {
    let config = project.load()?;
    let engine = BackupEngine::new(&project.root);

    let target = match args.to {
        Some(to) => project.root.join(to),
        None => engine.restore_target(&config, &args.backup)?,
    };

    if target.exists() && !args.force {
        bail!(
            "{} already exists, pass --force to overwrite it",
            target.display()
        );
    }

    let restored = engine
        .restore_to(&config, &args.backup, &target)
        .with_context(|| format!("Failed to restore {}", args.backup))?;

    println!("Restored {} -> {}", args.backup, restored.display());
    Ok(())
}

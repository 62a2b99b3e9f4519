//! List command implementation.

use super::Project;
use crate::backup::BackupEngine;
use crate::stats::format_size;
use anyhow::Result;
use clap::Args;

/// Arguments for the list command
#[derive(Args)]
pub struct ListArgs {
    /// Only show backups of this file name
    #[arg(long)]
    pub file: Option<String>,
}

/// Run the list command
pub fn run(args: ListArgs, project: &Project) -> Result<()> {
    let config = project.load()?;
    let backup_dir = config.backup_dir_in(&project.root);

    if !backup_dir.is_dir() {
        println!("No backups found (backup directory doesn't exist).");
        return Ok(());
    }

    let engine = BackupEngine::new(&project.root);
    let mut listing = engine.list_backups(&config)?;
    if let Some(file) = &args.file {
        listing.records.retain(|record| &record.name.file_name == file);
    }

    if listing.records.is_empty() {
        println!("No backups found.");
    } else {
        println!("Backups in {}:", backup_dir.display());
        println!();
        println!("{:<50} {:>12} {:<20}", "Filename", "Size", "Modified");
        println!("{}", "-".repeat(84));

        for record in &listing.records {
            println!(
                "{:<50} {:>12} {:<20}",
                record.name.to_file_name(),
                format_size(record.size),
                record.modified.format("%Y-%m-%d %H:%M:%S")
            );
        }

        println!();
        println!("Total: {} backup(s)", listing.records.len());
    }

    if !listing.unrecognized.is_empty() {
        println!(
            "{} other file(s) in the backup directory were ignored",
            listing.unrecognized.len()
        );
    }
    Ok(())
}

//! Stats command implementation.

use super::Project;
use crate::stats::{self, format_size, Stats};
use anyhow::Result;
use clap::Args;
use std::fmt::{self, Write};

/// Arguments for the stats command
#[derive(Args)]
pub struct StatsArgs {
    /// Print the statistics as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the stats command
pub fn run(args: StatsArgs, project: &Project) -> Result<()> {
    let config = project.load()?;
    let stats = stats::collect(&project.root, &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", render_stats(&stats, &config.backup_dir.display().to_string())?);
    }
    Ok(())
}

/// Plain-text report of `stats`
fn render_stats(stats: &Stats, backup_dir: &str) -> Result<String, fmt::Error> {
    let mut out = String::new();

    writeln!(out, "verctrl statistics")?;
    writeln!(out, "==================")?;
    writeln!(out)?;

    let tracked = &stats.tracked;
    writeln!(out, "Tracked files:")?;
    writeln!(out, "  Total:    {}", tracked.total)?;
    writeln!(out, "  Existing: {}", tracked.existing)?;
    if tracked.missing > 0 {
        writeln!(out, "  Missing:  {}", tracked.missing)?;
    }
    writeln!(out, "  Size:     {}", format_size(tracked.total_size))?;
    if !tracked.top_extensions.is_empty() {
        writeln!(out, "  Top extensions:")?;
        for (ext, count) in &tracked.top_extensions {
            writeln!(out, "    {:<16} {}", ext, count)?;
        }
    }
    writeln!(out)?;

    let backups = &stats.backups;
    writeln!(out, "Backups ({}):", backup_dir)?;
    if backups.dir_exists {
        writeln!(out, "  Total:  {}", backups.count)?;
        writeln!(out, "  Size:   {}", format_size(backups.total_size))?;
        if let (Some(oldest), Some(newest)) = (backups.oldest, backups.newest) {
            writeln!(out, "  Oldest: {}", oldest.format("%Y-%m-%d %H:%M:%S"))?;
            writeln!(out, "  Newest: {}", newest.format("%Y-%m-%d %H:%M:%S"))?;
        }
        if backups.unrecognized > 0 {
            writeln!(out, "  Other files: {}", backups.unrecognized)?;
        }
        if !backups.per_file.is_empty() {
            writeln!(out, "  Per file:")?;
            for (file, count) in &backups.per_file {
                writeln!(out, "    {:<32} {}", file, count)?;
            }
        }
    } else {
        writeln!(out, "  Backup directory doesn't exist yet")?;
    }
    writeln!(out)?;

    writeln!(out, "Settings:")?;
    writeln!(out, "  Naming scheme:   {}", stats.naming_scheme)?;
    if stats.keep_history == 0 {
        writeln!(out, "  Keep history:    unlimited")?;
    } else {
        writeln!(out, "  Keep history:    {}", stats.keep_history)?;
    }
    writeln!(out, "  Create new file: {}", stats.create_new_file)?;
    Ok(out)
}

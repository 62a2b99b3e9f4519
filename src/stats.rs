//! Read-only statistics over tracked files and the backup directory

use crate::config::Configuration;
use crate::naming::{self, NamingScheme};
use crate::Result;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Extensions reported in [`TrackedStats::top_extensions`]
pub const TOP_EXTENSIONS: usize = 5;

const NO_EXTENSION: &str = "(no extension)";

#[derive(Debug, Clone, Serialize)]
pub struct TrackedStats {
    pub total: usize,
    pub existing: usize,
    pub missing: usize,
    /// Combined size of the existing tracked files
    pub total_size: u64,
    /// Most common extensions among existing files, most frequent first
    pub top_extensions: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupStats {
    pub dir_exists: bool,
    pub count: usize,
    pub total_size: u64,
    pub oldest: Option<DateTime<Local>>,
    pub newest: Option<DateTime<Local>>,
    /// Backup count per tracked file name
    pub per_file: BTreeMap<String, usize>,
    /// Files in the backup directory that are not backups
    pub unrecognized: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub tracked: TrackedStats,
    pub backups: BackupStats,
    pub naming_scheme: NamingScheme,
    pub keep_history: usize,
    pub create_new_file: bool,
}

/// Gather statistics for the project rooted at `root`
pub fn collect<P: AsRef<Path>>(root: P, config: &Configuration) -> Result<Stats> {
    let root = root.as_ref();

    Ok(Stats {
        tracked: tracked_stats(root, config),
        backups: backup_stats(root, config)?,
        naming_scheme: config.naming_scheme,
        keep_history: config.keep_history,
        create_new_file: config.create_new_file,
    })
}

fn tracked_stats(root: &Path, config: &Configuration) -> TrackedStats {
    let tracked = config.tracked_files(root);
    let mut existing = 0;
    let mut total_size = 0;
    let mut extensions: HashMap<String, usize> = HashMap::new();

    for file in &tracked {
        let Ok(metadata) = file.absolute.metadata() else {
            continue;
        };
        existing += 1;
        total_size += metadata.len();

        let ext = file
            .file_name()
            .map(|name| naming::split_file_name(name).1)
            .filter(|ext| !ext.is_empty())
            .unwrap_or(NO_EXTENSION);
        *extensions.entry(ext.to_string()).or_insert(0) += 1;
    }

    let mut top_extensions: Vec<_> = extensions.into_iter().collect();
    top_extensions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_extensions.truncate(TOP_EXTENSIONS);

    TrackedStats {
        total: tracked.len(),
        existing,
        missing: tracked.len() - existing,
        total_size,
        top_extensions,
    }
}

fn backup_stats(root: &Path, config: &Configuration) -> Result<BackupStats> {
    let backup_dir = config.backup_dir_in(root);
    let listing = naming::scan_backup_dir(&backup_dir)?;

    let mut per_file = BTreeMap::new();
    for record in &listing.records {
        *per_file.entry(record.name.file_name.clone()).or_insert(0) += 1;
    }

    Ok(BackupStats {
        dir_exists: backup_dir.is_dir(),
        count: listing.records.len(),
        total_size: listing.records.iter().map(|r| r.size).sum(),
        oldest: listing.records.iter().map(|r| r.modified).min(),
        newest: listing.records.iter().map(|r| r.modified).max(),
        per_file,
        unrecognized: listing.unrecognized.len(),
    })
}

/// Human-readable size: bytes below 1 KB, otherwise two decimals
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let size = bytes as f64;
    if size < KB {
        format!("{bytes} B")
    } else if size < MB {
        format!("{:.2} KB", size / KB)
    } else if size < GB {
        format!("{:.2} MB", size / MB)
    } else {
        format!("{:.2} GB", size / GB)
    }
}

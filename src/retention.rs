//! Retention of past backups

use crate::naming::{backups_for, BackupRecord, BackupStamp, NamingScheme};
use crate::{Error, Result};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of one pruning pass
#[derive(Debug, Default)]
pub struct RetentionReport {
    /// Backups removed, oldest last
    pub deleted: Vec<PathBuf>,
    /// Backups that should have been removed but could not be
    pub failures: Vec<Error>,
}

/// Newest first: higher version or later timestamp, then by name for stability
fn newest_first(a: &BackupRecord, b: &BackupRecord) -> Ordering {
    let by_stamp = match (a.name.stamp, b.name.stamp) {
        (BackupStamp::Version(x), BackupStamp::Version(y)) => y.cmp(&x),
        (BackupStamp::Timestamp(x), BackupStamp::Timestamp(y)) => y.cmp(&x),
        _ => Ordering::Equal,
    };
    by_stamp.then_with(|| b.path.cmp(&a.path))
}

/// Pick the records to delete so that only the newest `keep` of `scheme` remain.
///
/// `keep == 0` means unlimited history. The simple scheme never accumulates history.
pub fn plan_deletions(
    mut records: Vec<BackupRecord>,
    scheme: NamingScheme,
    keep: usize,
) -> Vec<BackupRecord> {
    if keep == 0 || scheme == NamingScheme::Simple {
        return Vec::new();
    }

    records.retain(|record| record.name.stamp.scheme() == scheme);
    records.sort_by(newest_first);
    records.into_iter().skip(keep).collect()
}

/// Delete old backups of `file_name` after a new one has been written
pub fn prune_after_write<P: AsRef<Path>>(
    backup_dir: P,
    file_name: &str,
    scheme: NamingScheme,
    keep: usize,
) -> Result<RetentionReport> {
    let backup_dir = backup_dir.as_ref();
    let mut report = RetentionReport::default();

    let doomed = plan_deletions(backups_for(backup_dir, file_name)?, scheme, keep);
    if doomed.is_empty() {
        debug!("Nothing to prune for {}", file_name);
        return Ok(report);
    }

    for record in doomed {
        match fs::remove_file(&record.path) {
            Ok(()) => {
                info!("Removed old backup: {}", record.path.display());
                report.deleted.push(record.path);
            }
            Err(e) => {
                warn!("Failed to remove {}: {}", record.path.display(), e);
                report.failures.push(Error::from_io(&record.path, e));
            }
        }
    }

    Ok(report)
}

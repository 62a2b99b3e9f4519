//! Backup file naming.
//!
//! The backup directory has no index: every backup's owner and position in
//! history is encoded in its file name, so the directory listing is re-read on
//! every call instead of keeping counters around.

use crate::{Error, Result};
use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Date-time layout embedded by the timestamp scheme
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// How backup file names are derived from a tracked file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingScheme {
    /// `<stem>-v<N><ext>` with N increasing from 1
    #[default]
    Version,
    /// `<stem>-<YYYYMMDD>-<HHMMSS><ext>` from the local clock
    Timestamp,
    /// `<stem>-old<ext>`, overwritten on every backup
    Simple,
}

impl fmt::Display for NamingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingScheme::Version => write!(f, "version"),
            NamingScheme::Timestamp => write!(f, "timestamp"),
            NamingScheme::Simple => write!(f, "simple"),
        }
    }
}

impl FromStr for NamingScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "version" => Ok(NamingScheme::Version),
            "timestamp" => Ok(NamingScheme::Timestamp),
            "simple" => Ok(NamingScheme::Simple),
            other => Err(Error::Configuration {
                reason: format!("unknown naming scheme '{other}'"),
            }),
        }
    }
}

/// Position of a backup in its file's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackupStamp {
    Version(u64),
    Timestamp(NaiveDateTime),
    Simple,
}

impl BackupStamp {
    pub fn scheme(&self) -> NamingScheme {
        match self {
            BackupStamp::Version(_) => NamingScheme::Version,
            BackupStamp::Timestamp(_) => NamingScheme::Timestamp,
            BackupStamp::Simple => NamingScheme::Simple,
        }
    }
}

/// A backup file name decoded into the tracked file it belongs to and its stamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupName {
    /// File name of the tracked file, e.g. `config.json`
    pub file_name: String,
    pub stamp: BackupStamp,
}

impl BackupName {
    pub fn new(file_name: impl Into<String>, stamp: BackupStamp) -> Self {
        Self {
            file_name: file_name.into(),
            stamp,
        }
    }

    /// Decode a backup file name, trying version, then timestamp, then simple.
    pub fn parse(backup_file_name: &str) -> Option<Self> {
        let (stem, ext) = split_file_name(backup_file_name);

        if let Some((base, n)) = parse_version_stem(stem) {
            return Some(Self::new(format!("{base}{ext}"), BackupStamp::Version(n)));
        }
        if let Some((base, at)) = parse_timestamp_stem(stem) {
            return Some(Self::new(format!("{base}{ext}"), BackupStamp::Timestamp(at)));
        }
        match stem.strip_suffix("-old") {
            Some(base) if !base.is_empty() => {
                Some(Self::new(format!("{base}{ext}"), BackupStamp::Simple))
            }
            _ => None,
        }
    }

    /// Encode back into the on-disk file name
    pub fn to_file_name(&self) -> String {
        let (stem, ext) = split_file_name(&self.file_name);
        match self.stamp {
            BackupStamp::Version(n) => format!("{stem}-v{n}{ext}"),
            BackupStamp::Timestamp(at) => format!("{stem}-{}{ext}", at.format(TIMESTAMP_FORMAT)),
            BackupStamp::Simple => format!("{stem}-old{ext}"),
        }
    }
}

fn parse_version_stem(stem: &str) -> Option<(&str, u64)> {
    let (base, digits) = stem.rsplit_once("-v")?;
    if base.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(|n| (base, n))
}

fn parse_timestamp_stem(stem: &str) -> Option<(&str, NaiveDateTime)> {
    let (rest, time) = stem.rsplit_once('-')?;
    let (base, date) = rest.rsplit_once('-')?;
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if base.is_empty() || date.len() != 8 || time.len() != 6 || !all_digits(date) || !all_digits(time) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date}-{time}"), TIMESTAMP_FORMAT)
        .ok()
        .map(|at| (base, at))
}

/// Split a file name into stem and extension (with its dot).
///
/// A leading dot alone does not start an extension, so `.bashrc` has none.
pub(crate) fn split_file_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        None | Some(0) => (name, ""),
        Some(idx) => name.split_at(idx),
    }
}

/// One backup file found in the backup directory
#[derive(Debug, Clone)]
pub struct BackupRecord {
    pub name: BackupName,
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Local>,
}

/// Contents of a backup directory
#[derive(Debug, Default)]
pub struct BackupListing {
    pub records: Vec<BackupRecord>,
    /// Regular files whose names do not decode under any scheme
    pub unrecognized: Vec<PathBuf>,
}

/// Read every regular file in `backup_dir`.
///
/// A directory that does not exist yet is empty. Entries that cannot be read are skipped.
pub fn scan_backup_dir<P: AsRef<Path>>(backup_dir: P) -> Result<BackupListing> {
    let backup_dir = backup_dir.as_ref();
    let mut listing = BackupListing::default();

    if !backup_dir.is_dir() {
        return Ok(listing);
    }

    let entries = fs::read_dir(backup_dir).map_err(|e| Error::from_io(backup_dir, e))?;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", backup_dir.display(), e);
                continue;
            }
        };

        let path = entry.path();
        let metadata = match entry.metadata() {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => continue,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let name = entry
            .file_name()
            .to_str()
            .and_then(BackupName::parse);
        match name {
            Some(name) => listing.records.push(BackupRecord {
                name,
                size: metadata.len(),
                modified: metadata
                    .modified()
                    .map(DateTime::<Local>::from)
                    .unwrap_or_else(|_| Local::now()),
                path,
            }),
            None => {
                debug!("Ignoring unrelated file {}", path.display());
                listing.unrecognized.push(path);
            }
        }
    }

    Ok(listing)
}

/// Backups in `backup_dir` belonging to the tracked file named `file_name`
pub fn backups_for<P: AsRef<Path>>(backup_dir: P, file_name: &str) -> Result<Vec<BackupRecord>> {
    Ok(scan_backup_dir(backup_dir)?
        .records
        .into_iter()
        .filter(|record| record.name.file_name == file_name)
        .collect())
}

/// Path the next backup of `file_name` should be written to
pub fn next_backup_path<P: AsRef<Path>>(
    backup_dir: P,
    file_name: &str,
    scheme: NamingScheme,
) -> Result<PathBuf> {
    next_backup_path_at(backup_dir.as_ref(), file_name, scheme, Local::now().naive_local())
}

pub(crate) fn next_backup_path_at(
    backup_dir: &Path,
    file_name: &str,
    scheme: NamingScheme,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let stamp = match scheme {
        NamingScheme::Version => {
            let latest = backups_for(backup_dir, file_name)?
                .iter()
                .filter_map(|record| match record.name.stamp {
                    BackupStamp::Version(n) => Some(n),
                    _ => None,
                })
                .max()
                .unwrap_or(0);
            let next = latest.checked_add(1).ok_or_else(|| Error::NameCollision {
                path: backup_dir
                    .join(BackupName::new(file_name, BackupStamp::Version(latest)).to_file_name()),
            })?;
            BackupStamp::Version(next)
        }
        NamingScheme::Timestamp => {
            let now = now.with_nanosecond(0).unwrap_or(now);
            BackupStamp::Timestamp(now)
        }
        NamingScheme::Simple => BackupStamp::Simple,
    };

    let path = backup_dir.join(BackupName::new(file_name, stamp).to_file_name());
    if scheme == NamingScheme::Timestamp && path.exists() {
        return Err(Error::NameCollision { path });
    }

    debug!("Next backup for {}: {}", file_name, path.display());
    Ok(path)
}

//! Backup runs and restores over the tracked-file list

use crate::config::{Configuration, TrackedFile};
use crate::naming::{self, BackupListing, BackupName, NamingScheme};
use crate::retention;
use crate::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, span, warn, Level};

/// A file that was backed up successfully
#[derive(Debug)]
pub struct BackedUpFile {
    pub backup_path: PathBuf,
    /// Bytes copied
    pub bytes: u64,
    /// Older backups removed by retention
    pub pruned: Vec<PathBuf>,
    /// Whether the original was emptied afterwards
    pub source_reset: bool,
}

/// Result for one tracked file within a run
#[derive(Debug)]
pub struct FileReport {
    pub tracked: TrackedFile,
    pub outcome: Result<BackedUpFile>,
    /// Non-fatal problems, such as backups that could not be pruned
    pub warnings: Vec<Error>,
}

impl FileReport {
    pub fn is_missing(&self) -> bool {
        matches!(self.outcome, Err(Error::MissingSource { .. }))
    }
}

/// Per-file results of a backup run, in configuration order
#[derive(Debug, Default)]
pub struct BackupRunResult {
    pub files: Vec<FileReport>,
}

impl BackupRunResult {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_ok()).count()
    }

    pub fn missing(&self) -> usize {
        self.files.iter().filter(|f| f.is_missing()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded() - self.missing()
    }
}

/// Copies tracked files into the backup directory and back
pub struct BackupEngine {
    root: PathBuf,
}

impl BackupEngine {
    /// Create an engine for the project rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Back up every tracked file independently.
    ///
    /// A failing file is recorded and the run moves on to the next one.
    pub fn run_backup(&self, config: &Configuration) -> BackupRunResult {
        let span = span!(Level::INFO, "run_backup", scheme = %config.naming_scheme);
        let _enter = span.enter();

        let backup_dir = config.backup_dir_in(&self.root);
        let mut result = BackupRunResult::default();

        for tracked in config.tracked_files(&self.root) {
            let mut warnings = Vec::new();
            let outcome = self.backup_file(&tracked, &backup_dir, config, &mut warnings);

            match &outcome {
                Ok(done) => info!(
                    "Backed up: {} -> {} ({} bytes)",
                    tracked.relative.display(),
                    done.backup_path.display(),
                    done.bytes
                ),
                Err(Error::MissingSource { .. }) => {
                    warn!("File not found: {}", tracked.relative.display())
                }
                Err(e) => warn!("Failed to backup {}: {}", tracked.relative.display(), e),
            }

            result.files.push(FileReport {
                tracked,
                outcome,
                warnings,
            });
        }

        info!(
            "Backup run finished: {} succeeded, {} missing, {} failed",
            result.succeeded(),
            result.missing(),
            result.failed()
        );
        result
    }

    fn backup_file(
        &self,
        tracked: &TrackedFile,
        backup_dir: &Path,
        config: &Configuration,
        warnings: &mut Vec<Error>,
    ) -> Result<BackedUpFile> {
        let span = span!(Level::DEBUG, "backup_file", path = %tracked.relative.display());
        let _enter = span.enter();

        if !tracked.absolute.exists() {
            return Err(Error::MissingSource {
                path: tracked.relative.clone(),
            });
        }

        let file_name = tracked.file_name().ok_or_else(|| Error::Configuration {
            reason: format!("tracked path has no file name: {}", tracked.relative.display()),
        })?;

        fs::create_dir_all(backup_dir).map_err(|e| Error::from_io(backup_dir, e))?;

        let backup_path = naming::next_backup_path(backup_dir, file_name, config.naming_scheme)?;
        let exclusive = config.naming_scheme != NamingScheme::Simple;
        let bytes = copy_file(&tracked.absolute, &backup_path, exclusive)?;

        let mut pruned = Vec::new();
        if config.naming_scheme != NamingScheme::Simple {
            match retention::prune_after_write(
                backup_dir,
                file_name,
                config.naming_scheme,
                config.keep_history,
            ) {
                Ok(report) => {
                    pruned = report.deleted;
                    warnings.extend(report.failures);
                }
                Err(e) => warnings.push(e),
            }
        }

        let mut source_reset = false;
        if config.create_new_file {
            match File::create(&tracked.absolute) {
                Ok(_) => {
                    debug!("Created new empty file: {}", tracked.absolute.display());
                    source_reset = true;
                }
                Err(e) => warnings.push(Error::from_io(&tracked.absolute, e)),
            }
        }

        Ok(BackedUpFile {
            backup_path,
            bytes,
            pruned,
            source_reset,
        })
    }

    /// Every backup in the backup directory, most recently modified first
    pub fn list_backups(&self, config: &Configuration) -> Result<BackupListing> {
        let mut listing = naming::scan_backup_dir(config.backup_dir_in(&self.root))?;
        listing
            .records
            .sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
        listing.unrecognized.sort();
        Ok(listing)
    }

    /// Where `backup_name` restores to by default.
    ///
    /// The first tracked file with the same file name wins; an untracked name
    /// restores into the project root.
    pub fn restore_target(&self, config: &Configuration, backup_name: &str) -> Result<PathBuf> {
        let name = parse_backup_file_name(backup_name)?;

        let tracked = config
            .tracked_files(&self.root)
            .into_iter()
            .find(|t| t.file_name() == Some(name.file_name.as_str()));

        Ok(match tracked {
            Some(tracked) => tracked.absolute,
            None => {
                warn!(
                    "No tracked file named {}, restoring into the project root",
                    name.file_name
                );
                self.root.join(&name.file_name)
            }
        })
    }

    /// Copy a backup over the tracked file it belongs to
    pub fn restore(&self, config: &Configuration, backup_name: &str) -> Result<PathBuf> {
        let target = self.restore_target(config, backup_name)?;
        self.restore_to(config, backup_name, target)
    }

    /// Copy a backup to an explicit target, relative to the project root unless absolute
    pub fn restore_to<P: AsRef<Path>>(
        &self,
        config: &Configuration,
        backup_name: &str,
        target: P,
    ) -> Result<PathBuf> {
        parse_backup_file_name(backup_name)?;

        let source = config.backup_dir_in(&self.root).join(backup_name);
        if !source.is_file() {
            return Err(Error::BackupNotFound { path: source });
        }

        let target = self.root.join(target.as_ref());
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::SourceDirMissing {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::copy(&source, &target).map_err(|e| Error::from_io(&target, e))?;
        info!("Restored: {} -> {}", backup_name, target.display());
        Ok(target)
    }
}

fn parse_backup_file_name(backup_name: &str) -> Result<BackupName> {
    let bare = Path::new(backup_name).file_name().and_then(|n| n.to_str()) == Some(backup_name);
    bare.then(|| BackupName::parse(backup_name))
        .flatten()
        .ok_or_else(|| Error::UnknownBackup {
            name: backup_name.to_string(),
        })
}

/// Copy `source` to `dest`. With `exclusive`, an existing `dest` is a collision
/// rather than being overwritten. A partially written `dest` is removed.
fn copy_file(source: &Path, dest: &Path, exclusive: bool) -> Result<u64> {
    let mut reader = File::open(source).map_err(|e| Error::from_io(source, e))?;

    let mut options = OpenOptions::new();
    options.write(true);
    if exclusive {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }

    let mut writer = options.open(dest).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => Error::NameCollision {
            path: dest.to_path_buf(),
        },
        _ => Error::from_io(dest, e),
    })?;

    match io::copy(&mut reader, &mut writer) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(dest) {
                warn!("Failed to remove partial backup {}: {}", dest.display(), cleanup);
            }
            Err(Error::from_io(source, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::BackupStamp;
    use chrono::{Local, Timelike};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn config_for(files: &[&str]) -> Configuration {
        Configuration {
            files: files.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    fn backup_names(engine: &BackupEngine, config: &Configuration) -> Vec<String> {
        let mut names: Vec<String> = engine
            .list_backups(config)
            .unwrap()
            .records
            .iter()
            .map(|r| r.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_missing_file_does_not_block_others() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("present.txt"), "hello").unwrap();

        let engine = BackupEngine::new(root);
        let result = engine.run_backup(&config_for(&["gone.txt", "present.txt"]));

        assert_eq!(result.files.len(), 2);
        assert!(result.files[0].is_missing());
        let done = result.files[1].outcome.as_ref().unwrap();
        assert_eq!(done.bytes, 5);
        assert_eq!(fs::read(&done.backup_path).unwrap(), b"hello");
        assert_eq!((result.succeeded(), result.missing(), result.failed()), (1, 1, 0));
    }

    #[test]
    fn test_copy_failure_does_not_block_others() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("folder")).unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();

        let engine = BackupEngine::new(root);
        let result = engine.run_backup(&config_for(&["folder", "a.txt"]));

        assert!(result.files[0].outcome.is_err());
        assert!(!result.files[0].is_missing());
        assert!(result.files[1].outcome.is_ok());
        assert_eq!(backup_names(&engine, &config_for(&[])), vec!["a-v1.txt"]);
    }

    #[test]
    fn test_versions_accumulate_and_prune() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let mut config = config_for(&["notes.md"]);
        config.keep_history = 2;
        let engine = BackupEngine::new(root);

        for round in 1..=4 {
            fs::write(root.join("notes.md"), format!("round {round}")).unwrap();
            let result = engine.run_backup(&config);
            assert!(result.files[0].outcome.is_ok());
        }

        assert_eq!(backup_names(&engine, &config), vec!["notes-v3.md", "notes-v4.md"]);
        let v4 = config.backup_dir_in(root).join("notes-v4.md");
        assert_eq!(fs::read_to_string(v4).unwrap(), "round 4");
    }

    #[test]
    fn test_simple_scheme_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let mut config = config_for(&["data.csv"]);
        config.naming_scheme = NamingScheme::Simple;
        let engine = BackupEngine::new(root);

        fs::write(root.join("data.csv"), "first").unwrap();
        engine.run_backup(&config);
        fs::write(root.join("data.csv"), "second").unwrap();
        let result = engine.run_backup(&config);

        let done = result.files[0].outcome.as_ref().unwrap();
        assert_eq!(fs::read_to_string(&done.backup_path).unwrap(), "second");
        assert_eq!(backup_names(&engine, &config), vec!["data-old.csv"]);
    }

    #[test]
    fn test_timestamp_collision_is_per_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join("b.txt"), "b").unwrap();
        let mut config = config_for(&["a.txt", "b.txt"]);
        config.naming_scheme = NamingScheme::Timestamp;

        // Occupy a.txt's slot for this second and the next few
        let backup_dir = config.backup_dir_in(root);
        fs::create_dir_all(&backup_dir).unwrap();
        let now = Local::now().naive_local().with_nanosecond(0).unwrap();
        for offset in 0..5 {
            let stamp = BackupStamp::Timestamp(now + chrono::Duration::seconds(offset));
            let taken = BackupName::new("a.txt", stamp).to_file_name();
            fs::write(backup_dir.join(taken), "earlier").unwrap();
        }

        let result = BackupEngine::new(root).run_backup(&config);

        assert!(matches!(
            result.files[0].outcome,
            Err(Error::NameCollision { .. })
        ));
        let done = result.files[1].outcome.as_ref().unwrap();
        assert_eq!(fs::read_to_string(&done.backup_path).unwrap(), "b");
        assert_eq!((result.succeeded(), result.missing(), result.failed()), (1, 0, 1));
    }

    #[test]
    fn test_create_new_file_empties_source() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("log.txt"), "entries").unwrap();
        let mut config = config_for(&["log.txt"]);
        config.create_new_file = true;

        let result = BackupEngine::new(root).run_backup(&config);

        let done = result.files[0].outcome.as_ref().unwrap();
        assert!(done.source_reset);
        assert_eq!(fs::read_to_string(root.join("log.txt")).unwrap(), "");
        assert_eq!(fs::read_to_string(&done.backup_path).unwrap(), "entries");
    }

    #[test]
    fn test_failed_backup_keeps_source() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("log.txt"), "entries").unwrap();
        // A regular file where the backup directory should be
        fs::write(root.join(".verctrl_backups"), "").unwrap();
        let mut config = config_for(&["log.txt"]);
        config.create_new_file = true;

        let result = BackupEngine::new(root).run_backup(&config);

        assert!(result.files[0].outcome.is_err());
        assert_eq!(fs::read_to_string(root.join("log.txt")).unwrap(), "entries");
    }

    #[test]
    fn test_exclusive_copy_reports_collision() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.txt");
        let dest = temp_dir.path().join("a-v1.txt");
        fs::write(&src, "new").unwrap();
        fs::write(&dest, "old").unwrap();

        let err = copy_file(&src, &dest, true).unwrap_err();
        assert!(matches!(err, Error::NameCollision { .. }));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "old");

        assert_eq!(copy_file(&src, &dest, false).unwrap(), 3);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_restore_round_trip() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let config = config_for(&["conf/config.json"]);
        let engine = BackupEngine::new(root);
        fs::create_dir_all(root.join("conf")).unwrap();

        for body in ["{\"v\":1}", "{\"v\":2}", "{\"v\":3}"] {
            fs::write(root.join("conf/config.json"), body).unwrap();
            engine.run_backup(&config);
        }
        fs::remove_dir_all(root.join("conf")).unwrap();

        let restored = engine.restore(&config, "config-v3.json")?;
        assert_eq!(restored, root.join("conf/config.json"));
        assert_eq!(fs::read_to_string(&restored).unwrap(), "{\"v\":3}");

        engine.restore(&config, "config-v1.json")?;
        assert_eq!(fs::read_to_string(&restored).unwrap(), "{\"v\":1}");
        Ok(())
    }

    #[test]
    fn test_restore_untracked_goes_to_root() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let config = config_for(&[]);
        let backup_dir = config.backup_dir_in(root);
        fs::create_dir_all(&backup_dir).unwrap();
        fs::write(backup_dir.join("old-20240101-101010.txt"), "archived").unwrap();

        let engine = BackupEngine::new(root);
        let restored = engine.restore(&config, "old-20240101-101010.txt")?;
        assert_eq!(restored, root.join("old.txt"));

        let elsewhere = engine.restore_to(&config, "old-20240101-101010.txt", "copies/old.txt")?;
        assert_eq!(fs::read_to_string(elsewhere).unwrap(), "archived");
        Ok(())
    }

    #[test]
    fn test_restore_errors() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let config = config_for(&["blocked/x.txt"]);
        let backup_dir = config.backup_dir_in(root);
        fs::create_dir_all(&backup_dir).unwrap();
        fs::write(backup_dir.join("x-v1.txt"), "x").unwrap();
        fs::write(root.join("blocked"), "not a directory").unwrap();
        let engine = BackupEngine::new(root);

        let err = engine.restore(&config, "notes.txt").unwrap_err();
        assert!(matches!(err, Error::UnknownBackup { .. }));

        let err = engine.restore(&config, "../x-v1.txt").unwrap_err();
        assert!(matches!(err, Error::UnknownBackup { .. }));

        let err = engine.restore(&config, "x-v2.txt").unwrap_err();
        assert!(matches!(err, Error::BackupNotFound { .. }));

        let err = engine.restore(&config, "x-v1.txt").unwrap_err();
        assert!(matches!(err, Error::SourceDirMissing { .. }));
    }

    #[test]
    fn test_list_backups_splits_unrecognized() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let config = config_for(&[]);
        let backup_dir = config.backup_dir_in(root);
        fs::create_dir_all(&backup_dir).unwrap();
        fs::write(backup_dir.join("a-v1.txt"), "").unwrap();
        fs::write(backup_dir.join("b-old.txt"), "").unwrap();
        fs::write(backup_dir.join("notes"), "").unwrap();

        let listing = BackupEngine::new(root).list_backups(&config)?;
        assert_eq!(listing.records.len(), 2);
        assert_eq!(listing.unrecognized, vec![backup_dir.join("notes")]);
        Ok(())
    }
}

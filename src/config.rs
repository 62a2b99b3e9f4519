//! Project configuration stored as `verctrl.json`

use crate::ignore::normalize;
use crate::naming::NamingScheme;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = "verctrl.json";
pub const DEFAULT_BACKUP_DIR: &str = ".verctrl_backups";
pub const DEFAULT_KEEP_HISTORY: usize = 5;

fn default_keep_history() -> usize {
    DEFAULT_KEEP_HISTORY
}

/// Versioning settings and the tracked-file list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Tracked paths relative to the project root, in display order
    pub files: Vec<String>,
    /// Where backups are written, relative to the project root unless absolute
    pub backup_dir: PathBuf,
    pub naming_scheme: NamingScheme,
    /// Backups kept per file; 0 keeps every backup
    #[serde(default = "default_keep_history")]
    pub keep_history: usize,
    /// Empty the original after each successful backup
    #[serde(default)]
    pub create_new_file: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            naming_scheme: NamingScheme::Version,
            keep_history: DEFAULT_KEEP_HISTORY,
            create_new_file: false,
        }
    }
}

/// A tracked path resolved against the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    pub relative: PathBuf,
    pub absolute: PathBuf,
}

impl TrackedFile {
    /// File name used to key its backups
    pub fn file_name(&self) -> Option<&str> {
        self.relative.file_name().and_then(|name| name.to_str())
    }
}

impl Configuration {
    /// Load config from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| Error::from_io(path, e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| Error::Configuration {
            reason: format!("{}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save config as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::from_io(parent, e))?;
        }

        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        fs::write(path, content).map_err(|e| Error::from_io(path, e))?;

        debug!("Config saved to {}", path.display());
        Ok(())
    }

    /// Validate config settings
    pub fn validate(&self) -> Result<()> {
        if self.backup_dir.as_os_str().is_empty() {
            return Err(Error::Configuration {
                reason: "backup_dir must not be empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for file in &self.files {
            if !seen.insert(file) {
                warn!("File tracked more than once: {}", file);
            }
        }

        if self.keep_history == 0 {
            debug!("keep_history is 0, backups are never pruned");
        }

        Ok(())
    }

    /// Absolute backup directory for a project rooted at `root`
    pub fn backup_dir_in<P: AsRef<Path>>(&self, root: P) -> PathBuf {
        root.as_ref().join(&self.backup_dir)
    }

    /// Tracked files in configuration order, resolved against `root`
    pub fn tracked_files<P: AsRef<Path>>(&self, root: P) -> Vec<TrackedFile> {
        let root = root.as_ref();
        self.files
            .iter()
            .map(|file| TrackedFile {
                relative: PathBuf::from(file),
                absolute: root.join(file),
            })
            .collect()
    }

    /// Append paths not tracked yet, keeping the existing order. Returns how many were added.
    pub fn add_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut known: HashSet<String> = self.files.iter().cloned().collect();
        let before = self.files.len();

        for path in paths {
            let path = normalize(path.as_ref());
            if !path.is_empty() && known.insert(path.clone()) {
                self.files.push(path);
            }
        }

        self.files.len() - before
    }

    /// Stop tracking the given paths. Returns how many were removed.
    pub fn remove_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let doomed: HashSet<String> = paths.into_iter().map(|p| normalize(p.as_ref())).collect();
        let before = self.files.len();
        self.files.retain(|file| !doomed.contains(&normalize(Path::new(file))));
        before - self.files.len()
    }
}

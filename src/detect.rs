//! File discovery strategies for populating the tracked-file list

use crate::ignore::{normalize, PatternMatcher};
use crate::{Error, Result};
use clap::ValueEnum;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, SystemTime};
use tracing::{debug, span, warn, Level};
use walkdir::{DirEntry, WalkDir};

/// Programming, markup, config and documentation extensions
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "java", "c", "cpp", "h", "hpp", "cs", "go", "rs", "rb",
    "php", "swift", "kt", "scala", "html", "css", "scss", "sass", "less", "vue", "svelte",
    "json", "yaml", "yml", "toml", "ini", "conf", "config", "md", "rst", "txt", "adoc", "sh",
    "bash", "zsh", "fish", "ps1", "bat", "cmd", "sql", "graphql", "proto",
];

/// Extensions treated as binary content
pub const BINARY_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "ico", "svg", "mp4", "avi", "mov", "wmv", "flv", "mp3",
    "wav", "ogg", "flac", "zip", "tar", "gz", "rar", "7z", "pdf", "doc", "docx", "xls", "xlsx",
    "ppt", "pptx",
];

pub const PYTHON_EXTENSIONS: &[&str] = &["py"];

pub const WEB_EXTENSIONS: &[&str] = &["html", "css", "js", "ts", "jsx", "tsx", "vue", "svelte"];

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Named discovery algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Strategy {
    /// Everything not ignored by defaults or .gitignore, minus binaries
    Smart,
    /// Source, markup, config and doc files, ignoring .gitignore
    Source,
    /// Like smart, limited to files modified in the last N days
    Recent,
    /// Python files only
    Python,
    /// Web files (HTML, CSS, JS, TS, ...)
    Web,
    /// Everything not excluded by the built-in defaults
    All,
}

impl Strategy {
    /// Whether the project ignore file participates in pruning
    pub fn uses_project_ignore(&self) -> bool {
        !matches!(self, Strategy::Source | Strategy::All)
    }

    fn accepts_extension(&self, ext: &str) -> bool {
        match self {
            Strategy::Smart | Strategy::Recent => !BINARY_EXTENSIONS.contains(&ext),
            Strategy::Source => SOURCE_EXTENSIONS.contains(&ext),
            Strategy::Python => PYTHON_EXTENSIONS.contains(&ext),
            Strategy::Web => WEB_EXTENSIONS.contains(&ext),
            Strategy::All => true,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Smart => "smart",
            Strategy::Source => "source",
            Strategy::Recent => "recent",
            Strategy::Python => "python",
            Strategy::Web => "web",
            Strategy::All => "all",
        };
        f.write_str(name)
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        <Strategy as ValueEnum>::from_str(s, true).map_err(|_| Error::InvalidOption {
            reason: format!("unknown strategy '{s}'"),
        })
    }
}

/// Parameters shared by all strategies
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Age limit for the recent strategy, must be positive
    pub days: i64,
    /// Project ignore lines, comments and blanks already stripped
    pub ignore_lines: Vec<String>,
    /// Paths never reported nor descended into, such as the backup directory
    /// and the configuration file. Relative paths are taken from the root.
    pub exclude: Vec<PathBuf>,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            days: 30,
            ignore_lines: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

/// A configured strategy over one directory tree.
///
/// Holds no traversal state: every call to [`Discovery::iter`] walks the tree afresh.
#[derive(Debug, Clone)]
pub struct Discovery {
    root: PathBuf,
    strategy: Strategy,
    matcher: PatternMatcher,
    excluded: Vec<String>,
    max_age: Option<Duration>,
}

impl Discovery {
    pub fn new<P: AsRef<Path>>(root: P, strategy: Strategy, options: &DiscoverOptions) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        let max_age = if strategy == Strategy::Recent {
            if options.days <= 0 {
                return Err(Error::InvalidOption {
                    reason: format!("days must be a positive integer, got {}", options.days),
                });
            }
            // A window longer than representable covers every file
            let secs = (options.days as u64)
                .checked_mul(SECS_PER_DAY)
                .unwrap_or(u64::MAX);
            Some(Duration::from_secs(secs))
        } else {
            None
        };

        let matcher = if strategy.uses_project_ignore() {
            PatternMatcher::new(&options.ignore_lines)
        } else {
            PatternMatcher::with_defaults()
        };

        let excluded = options
            .exclude
            .iter()
            .filter_map(|path| {
                let rel = if path.is_absolute() {
                    path.strip_prefix(&root).ok()?
                } else {
                    path.as_path()
                };
                Some(normalize(rel))
            })
            .filter(|rel| !rel.is_empty())
            .collect();

        Ok(Self {
            root,
            strategy,
            matcher,
            excluded,
            max_age,
        })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Walk the tree, yielding root-relative paths of accepted files.
    ///
    /// At every level subdirectories come before files, each sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = PathBuf> + '_ {
        let cutoff = self
            .max_age
            .and_then(|age| SystemTime::now().checked_sub(age));

        WalkDir::new(&self.root)
            .follow_links(false)
            .min_depth(1)
            .sort_by(dirs_first)
            .into_iter()
            .filter_entry(move |entry| !self.prune(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping entry due to error: {}", e);
                    None
                }
            })
            .filter(|entry| !entry.file_type().is_dir())
            .filter_map(move |entry| self.accept(&entry, cutoff))
    }

    fn relative<'a>(&self, entry: &'a DirEntry) -> Option<&'a Path> {
        entry.path().strip_prefix(&self.root).ok()
    }

    fn prune(&self, entry: &DirEntry) -> bool {
        let Some(rel) = self.relative(entry).map(normalize) else {
            return false;
        };

        let self_tracking = self.excluded.iter().any(|ex| {
            rel == *ex || (rel.starts_with(ex.as_str()) && rel.as_bytes().get(ex.len()) == Some(&b'/'))
        });
        if self_tracking {
            debug!("Skipping verctrl's own path: {}", rel);
            return true;
        }

        self.matcher.is_excluded_entry(&rel, entry.file_type().is_dir())
    }

    fn accept(&self, entry: &DirEntry, cutoff: Option<SystemTime>) -> Option<PathBuf> {
        let ext = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !self.strategy.accepts_extension(&ext) {
            return None;
        }

        if let Some(cutoff) = cutoff {
            let modified = entry.metadata().ok().and_then(|m| m.modified().ok())?;
            if modified < cutoff {
                return None;
            }
        }

        self.relative(entry).map(Path::to_path_buf)
    }
}

fn dirs_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    b.file_type()
        .is_dir()
        .cmp(&a.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Run `strategy` over `root` and collect the relative paths it accepts
pub fn discover<P: AsRef<Path>>(root: P, strategy: Strategy, options: &DiscoverOptions) -> Result<Vec<PathBuf>> {
    let span = span!(Level::INFO, "discover", strategy = %strategy);
    let _enter = span.enter();

    let discovery = Discovery::new(root, strategy, options)?;
    let found: Vec<PathBuf> = discovery.iter().collect();
    debug!("Strategy {} found {} files", strategy, found.len());
    Ok(found)
}

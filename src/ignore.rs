//! Ignore-file pattern compilation and matching.
//!
//! Rules follow `.gitignore` conventions: a pattern without a slash matches a
//! basename at any depth, a pattern with a slash is anchored to the project root,
//! a trailing `/` restricts the rule to directories and a leading `!` re-includes
//! a path excluded by an earlier rule. The last matching rule wins.

use globset::{GlobBuilder, GlobMatcher};
use std::borrow::Cow;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, warn};

/// Built-in exclusions, compiled before any project rule.
pub const DEFAULT_RULES: &[&str] = &[
    // Hidden directories
    ".*/",
    // Version control
    ".git/",
    ".svn/",
    ".hg/",
    ".bzr/",
    // Dependencies and virtual environments
    "node_modules/",
    "bower_components/",
    "vendor/",
    "__pycache__/",
    "venv/",
    ".venv/",
    "env/",
    ".env/",
    "ENV/",
    "*.egg-info/",
    ".Python",
    // Build output and caches
    "dist/",
    "build/",
    ".pytest_cache/",
    ".cache/",
    "logs/",
    "tmp/",
    "temp/",
    ".tmp/",
    ".verctrl_backups/",
    // IDE and editor state
    ".idea/",
    ".vscode/",
    ".vs/",
    "*.swp",
    "*.swo",
    "*~",
    // OS metadata
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    // Compiled objects, logs and stale copies
    "*.pyc",
    "*.pyo",
    "*.pyd",
    "*.o",
    "*.so",
    "*.dylib",
    "*.dll",
    "*.exe",
    "*.log",
    "*.bak",
    "*.backup",
    "*.old",
];

/// A single compiled ignore rule
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pattern: String,
    negated: bool,
    dir_only: bool,
    anchored: bool,
    glob: GlobMatcher,
}

impl IgnoreRule {
    /// Parse one ignore line.
    ///
    /// Returns `Ok(None)` for blank lines, comments and lines that reduce to nothing.
    pub fn parse(line: &str) -> Result<Option<Self>, globset::Error> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        // "\!name" and "\#name" match literal leading characters
        let body = body
            .strip_prefix("\\!")
            .map(|rest| format!("!{rest}"))
            .or_else(|| body.strip_prefix("\\#").map(|rest| format!("#{rest}")))
            .unwrap_or_else(|| body.to_string());

        let (dir_only, body) = match body.strip_suffix('/') {
            Some(rest) => (true, rest.to_string()),
            None => (false, body),
        };

        let anchored = body.contains('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return Ok(None);
        }

        let glob = GlobBuilder::new(body)
            .literal_separator(true)
            .backslash_escape(true)
            .build()?
            .compile_matcher();

        Ok(Some(Self {
            pattern: line.to_string(),
            negated,
            dir_only,
            anchored,
            glob,
        }))
    }

    /// The raw line this rule was compiled from
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_negation(&self) -> bool {
        self.negated
    }

    pub fn is_dir_only(&self) -> bool {
        self.dir_only
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Test a normalized, root-relative path against this rule
    fn is_match(&self, rel_path: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }

        if self.anchored {
            self.glob.is_match(rel_path)
        } else {
            let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
            self.glob.is_match(name)
        }
    }
}

/// Ordered, immutable rule list deciding which paths are excluded
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    rules: Vec<IgnoreRule>,
}

impl PatternMatcher {
    /// Matcher with no rules; excludes nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in exclusions only
    pub fn with_defaults() -> Self {
        Self::empty().extend(DEFAULT_RULES)
    }

    /// Built-in exclusions followed by the project ignore lines
    pub fn new<S: AsRef<str>>(project_lines: &[S]) -> Self {
        Self::with_defaults().extend(project_lines)
    }

    /// Append rules after the existing ones, giving them higher priority.
    ///
    /// Lines that fail to compile are skipped.
    pub fn extend<S: AsRef<str>>(mut self, lines: &[S]) -> Self {
        for line in lines {
            let line = line.as_ref();
            match IgnoreRule::parse(line) {
                Ok(Some(rule)) => self.rules.push(rule),
                Ok(None) => {}
                Err(e) => warn!("Skipping malformed ignore pattern '{}': {}", line, e),
            }
        }
        self
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Whether `path` is excluded.
    ///
    /// Every ancestor directory is tested first: once a directory is excluded,
    /// nothing beneath it can be re-included.
    pub fn matches<P: AsRef<Path>>(&self, path: P, is_dir: bool) -> bool {
        let rel = normalize(path.as_ref());
        if rel.is_empty() {
            return false;
        }

        for (idx, _) in rel.match_indices('/').filter(|(idx, _)| *idx > 0) {
            if self.is_excluded_entry(&rel[..idx], true) {
                return true;
            }
        }

        self.is_excluded_entry(&rel, is_dir)
    }

    /// Decide a single entry whose ancestors are already known to be included.
    pub(crate) fn is_excluded_entry(&self, rel_path: &str, is_dir: bool) -> bool {
        match self.rules.iter().rev().find(|rule| rule.is_match(rel_path, is_dir)) {
            Some(rule) => {
                debug!("'{}' decided by rule '{}'", rel_path, rule.pattern);
                !rule.negated
            }
            None => false,
        }
    }
}

/// Forward-slash form of a path with `.` components removed.
///
/// `..` and a leading root are kept, so paths outside the project stay distinct.
pub(crate) fn normalize(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        let part = match component {
            Component::CurDir => continue,
            Component::Prefix(prefix) => {
                out.push_str(&prefix.as_os_str().to_string_lossy());
                continue;
            }
            Component::RootDir => {
                out.push('/');
                continue;
            }
            Component::ParentDir => Cow::Borrowed(".."),
            Component::Normal(part) => part.to_string_lossy(),
        };
        if !out.is_empty() && !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(&part);
    }
    out
}

/// Read a project ignore file into raw pattern lines.
///
/// Comments and blank lines are dropped. A missing or unreadable file yields no rules.
pub fn read_ignore_file<P: AsRef<Path>>(path: P) -> Vec<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Vec::new();
    }

    match fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect(),
        Err(e) => {
            warn!("Failed to read ignore file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

//! # verctrl
//!
//! Lightweight local file versioning with smart file detection.
//!
//! ## Features
//!
//! - **Detection**: gitignore-style rules and named strategies pick files to track
//! - **Naming**: numbered, timestamped or single-slot backup names
//! - **Retention**: keeps the newest N backups of each file
//! - **Restore**: copies a backup back over the file it came from
//!
//! The backup directory is the only state: every backup's owner and position
//! in history is encoded in its file name.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use verctrl::{BackupEngine, Configuration};
//!
//! # fn main() -> verctrl::Result<()> {
//! let config = Configuration::load("verctrl.json")?;
//! let engine = BackupEngine::new(".");
//!
//! let result = engine.run_backup(&config);
//! println!("{} file(s) backed up", result.succeeded());
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod ignore;
pub mod logging;
pub mod naming;
pub mod retention;
pub mod stats;

// Re-export commonly used types
pub use backup::{BackupEngine, BackupRunResult, FileReport};
pub use config::{Configuration, TrackedFile};
pub use detect::{discover, DiscoverOptions, Discovery, Strategy};
pub use error::{Error, Result};
pub use ignore::PatternMatcher;
pub use naming::{BackupName, BackupRecord, NamingScheme};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

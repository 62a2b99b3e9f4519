//! Error types for verctrl

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for verctrl operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid option: {reason}")]
    InvalidOption { reason: String },

    #[error("Source file not found: {path}")]
    MissingSource { path: PathBuf },

    #[error("Backup already exists: {path}")]
    NameCollision { path: PathBuf },

    #[error("Not a recognized backup name: {name}")]
    UnknownBackup { name: String },

    #[error("Backup not found: {path}")]
    BackupNotFound { path: PathBuf },

    #[error("Cannot create directory {path}: {source}")]
    SourceDirMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },
}

impl Error {
    /// Attach a path to an IO error, splitting out permission failures.
    pub fn from_io<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::PermissionDenied => Error::PermissionDenied { path },
            _ => Error::Io { path, source },
        }
    }
}

/// Result type alias for verctrl operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_is_split_out() {
        let err = Error::from_io(
            "locked.txt",
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, Error::PermissionDenied { ref path } if path == Path::new("locked.txt")));
    }

    #[test]
    fn test_other_io_errors_keep_source() {
        let err = Error::from_io("gone.txt", io::Error::new(io::ErrorKind::NotFound, "gone"));
        match err {
            Error::Io { path, source } => {
                assert_eq!(path, PathBuf::from("gone.txt"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

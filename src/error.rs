//! Error types for profile synchronization.
//!
//! Only conditions that abort a run (or a single classifier call) are errors.
//! Missing profile files and stale entries are recovered locally and reported
//! as [`ProfileWarning`](crate::models::ProfileWarning) values instead.

use camino::Utf8PathBuf;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for synchronization operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while synchronizing profiles
#[derive(Error, Debug)]
pub enum SyncError {
    /// A required file or directory (settings file, mod directory,
    /// profiles directory, selected profile) does not exist
    #[error("Required path not found: {0}")]
    NotFound(Utf8PathBuf),

    /// A content file could not be read far enough to classify it
    #[error("Failed to read {path}: {reason}")]
    ReadError { path: Utf8PathBuf, reason: String },

    /// Any other filesystem failure
    #[error("IO error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The installation settings could not be interpreted
    #[error("Invalid installation settings: {0}")]
    InvalidSettings(String),

    /// A directory entry whose name is not valid UTF-8
    #[error("Path is not valid UTF-8: {0:?}")]
    NonUtf8Path(PathBuf),

    /// A profile task panicked or was cancelled
    #[error("Profile task failed: {0}")]
    Task(String),
}

impl SyncError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

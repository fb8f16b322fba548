//! Single-stat classification of a filesystem path.
//!
//! Callers match on [`PathKind`] once instead of re-querying existence,
//! file-ness and emptiness separately.

use crate::error::{Result, SyncError};
use camino::Utf8Path;
use std::io::ErrorKind;

/// What is at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Absent,
    File,
    Directory { empty: bool },
}

impl PathKind {
    pub fn exists(self) -> bool {
        !matches!(self, Self::Absent)
    }

    pub fn is_file(self) -> bool {
        matches!(self, Self::File)
    }

    pub fn is_dir(self) -> bool {
        matches!(self, Self::Directory { .. })
    }
}

/// Stat `path` and, for directories, check whether they have any entry.
pub async fn probe(path: &Utf8Path) -> Result<PathKind> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PathKind::Absent),
        Err(e) => return Err(SyncError::io(path, e)),
    };

    if metadata.is_dir() {
        let mut entries = tokio::fs::read_dir(path)
            .await
            .map_err(|e| SyncError::io(path, e))?;
        let empty = entries
            .next_entry()
            .await
            .map_err(|e| SyncError::io(path, e))?
            .is_none();
        Ok(PathKind::Directory { empty })
    } else {
        Ok(PathKind::File)
    }
}

/// Require an existing directory, failing with [`SyncError::NotFound`]
pub async fn require_dir(path: &Utf8Path) -> Result<()> {
    if probe(path).await?.is_dir() {
        Ok(())
    } else {
        Err(SyncError::NotFound(path.to_path_buf()))
    }
}

//! Sorted index of installed packages (mod directories).
//!
//! Built once per installation and shared read-only across profile runs.

use crate::error::{Result, SyncError};
use crate::services::fs_probe::require_dir;
use camino::{Utf8Path, Utf8PathBuf};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Name comparison used for every name-based ordering.
///
/// Compares by Unicode lowercase first so "alpha" and "Beta" sort the way a
/// file manager shows them, then ordinally so the order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}

pub fn sort_names(names: &mut [String]) {
    names.sort_by(|a, b| compare_names(a, b));
}

/// Installed package names in name order
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    mod_directory: Utf8PathBuf,
    names: Vec<String>,
    lookup: HashSet<String>,
}

impl PackageIndex {
    /// List the immediate subdirectories of the package store.
    ///
    /// Fails with [`SyncError::NotFound`] when the store does not exist.
    pub async fn build(mod_directory: &Utf8Path) -> Result<Self> {
        require_dir(mod_directory).await?;

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(mod_directory)
            .await
            .map_err(|e| SyncError::io(mod_directory, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SyncError::io(mod_directory, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| SyncError::io(mod_directory, e))?;
            if !file_type.is_dir() {
                continue;
            }

            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => {
                    tracing::warn!("Skipping mod directory with non UTF-8 name: {:?}", raw);
                }
            }
        }

        tracing::info!("Indexed {} mods in {}", names.len(), mod_directory);
        Ok(Self::from_names(mod_directory, names))
    }

    /// Build an index from known names (sorted here)
    pub fn from_names(mod_directory: impl Into<Utf8PathBuf>, mut names: Vec<String>) -> Self {
        sort_names(&mut names);
        names.dedup();
        let lookup = names.iter().cloned().collect();
        Self {
            mod_directory: mod_directory.into(),
            names,
            lookup,
        }
    }

    pub fn mod_directory(&self) -> &Utf8Path {
        &self.mod_directory
    }

    /// Package directory for `name`
    pub fn package_dir(&self, name: &str) -> Utf8PathBuf {
        self.mod_directory.join(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

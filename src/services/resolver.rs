//! Third-party load order from the enabled packages.
//!
//! Packages are walked in priority-ascending order and their load units
//! collected. When two packages ship the same load unit (compared without
//! case) the later package wins and the unit takes the later position.

use crate::error::{Result, SyncError};
use crate::models::{GameLayout, LoadUnit, ProfileWarning};
use crate::services::classifier::classify_file;
use crate::services::package_index::{compare_names, sort_names};
use camino::Utf8Path;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Resolved third-party load order of one profile
#[derive(Debug, Clone, Default)]
pub struct ResolvedLoadOrder {
    pub units: Vec<LoadUnit>,
    /// Load units dropped because a later package shipped the same name
    pub duplicates_dropped: usize,
    pub warnings: Vec<ProfileWarning>,
}

impl ResolvedLoadOrder {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|unit| unit.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Membership by name, compared after Unicode lowercasing
    pub fn contains(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.units
            .iter()
            .any(|unit| unit.name.to_lowercase() == name)
    }
}

/// Keep the last occurrence of each name (case-insensitive), at the
/// position of that last occurrence.
pub fn dedup_keep_last<T>(items: Vec<T>, key: impl Fn(&T) -> String) -> (Vec<T>, usize) {
    let mut by_key: IndexMap<String, T> = IndexMap::with_capacity(items.len());
    let mut dropped = 0;

    for item in items {
        let item_key = key(&item).to_lowercase();
        if by_key.shift_remove(&item_key).is_some() {
            dropped += 1;
        }
        by_key.insert(item_key, item);
    }

    (by_key.into_values().collect(), dropped)
}

/// Load unit file names directly inside one package directory, in name order.
///
/// A package directory that vanished since indexing contributes nothing.
pub async fn list_package_units(package_dir: &Utf8Path, layout: &GameLayout) -> Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(package_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Mod directory disappeared: {}", package_dir);
            return Ok(Vec::new());
        }
        Err(e) => return Err(SyncError::io(package_dir, e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SyncError::io(package_dir, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| SyncError::io(package_dir, e))?;
        if !file_type.is_file() {
            continue;
        }

        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| SyncError::NonUtf8Path(entry.path()))?;
        if layout.is_load_unit_name(&name) {
            names.push(name);
        }
    }

    sort_names(&mut names);
    Ok(names)
}

/// Lowercased load unit names shipped by any of `packages`.
pub async fn installed_unit_names(
    packages: &[String],
    mod_directory: &Utf8Path,
    layout: &GameLayout,
) -> Result<HashSet<String>> {
    let mut names = HashSet::new();
    for package in packages {
        let package_dir = mod_directory.join(package);
        for name in list_package_units(&package_dir, layout).await? {
            names.insert(name.to_lowercase());
        }
    }
    Ok(names)
}

/// Resolve the load order for `enabled_packages` (priority ascending).
///
/// With `sort_by_name` the packages are walked in name order instead.
/// Vanilla masters shipped by a package are left out; they have fixed
/// positions in loadorder.
pub async fn resolve(
    enabled_packages: &[String],
    mod_directory: &Utf8Path,
    sort_by_name: bool,
    layout: &GameLayout,
) -> Result<ResolvedLoadOrder> {
    let mut packages: Vec<&String> = enabled_packages.iter().collect();
    if sort_by_name {
        packages.sort_by(|a, b| compare_names(a, b));
    }

    let mut candidates = Vec::new();
    for package in packages {
        let package_dir = mod_directory.join(package);
        for name in list_package_units(&package_dir, layout).await? {
            if layout.is_vanilla_master(&name) {
                tracing::debug!("Ignoring vanilla master {} shipped by {}", name, package);
                continue;
            }
            candidates.push((package.clone(), name));
        }
    }

    let (candidates, duplicates_dropped) = dedup_keep_last(candidates, |(_, name)| name.clone());

    let mut resolved = ResolvedLoadOrder {
        duplicates_dropped,
        ..Default::default()
    };

    for (package, name) in candidates {
        let path = mod_directory.join(&package).join(&name);
        let kind = match classify_file(&path, layout).await {
            Ok(kind) => Some(kind),
            Err(e) => {
                tracing::warn!("Could not classify {}: {}", path, e);
                resolved.warnings.push(ProfileWarning::UnclassifiedUnit {
                    name: name.clone(),
                    reason: e.to_string(),
                });
                None
            }
        };
        resolved.units.push(LoadUnit {
            name,
            package,
            kind,
        });
    }

    tracing::debug!(
        "Resolved {} plugins from {} mods ({} duplicates dropped)",
        resolved.units.len(),
        enabled_packages.len(),
        resolved.duplicates_dropped
    );

    Ok(resolved)
}

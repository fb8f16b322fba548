//! Reads modlist and plugins of a profile into a [`ProfileState`].
//!
//! modlist stores packages highest priority first, so its entries are read
//! bottom-up to get priority-ascending order. `+` marks an enabled package,
//! any other marker a disabled one. plugins only records enable state: a
//! `*` marks an enabled load unit. loadorder is output only; just its
//! presence is recorded.
//!
//! Missing files and entries for packages that are no longer installed are
//! recovered as [`ProfileWarning`]s, never errors.

use crate::error::{Result, SyncError};
use crate::models::{ContentPackage, GameLayout, ProfileFile, ProfileState, ProfileWarning};
use crate::services::fs_probe::{PathKind, probe};
use crate::services::package_index::PackageIndex;
use camino::Utf8Path;
use std::collections::HashSet;

/// Number of header lines at the top of every profile file
pub const HEADER_LINE_COUNT: usize = 1;

const ENABLED_PACKAGE_MARKER: char = '+';
const ENABLED_UNIT_MARKER: char = '*';

/// Read the lines of a profile file, or `None` when it is not a file.
///
/// Invalid UTF-8 is replaced rather than rejected and a leading BOM is
/// dropped; both CRLF and LF line ends are accepted.
pub async fn read_profile_lines(path: &Utf8Path) -> Result<Option<Vec<String>>> {
    match probe(path).await? {
        PathKind::File => {}
        PathKind::Absent => return Ok(None),
        PathKind::Directory { .. } => {
            tracing::warn!("Expected a file but found a directory: {}", path);
            return Ok(None);
        }
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SyncError::io(path, e))?;
    let content = String::from_utf8_lossy(&bytes);
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    Ok(Some(content.lines().map(str::to_string).collect()))
}

/// Entry lines after the header, skipping blank lines and comments
fn entry_lines(lines: &[String]) -> impl DoubleEndedIterator<Item = &str> {
    lines
        .iter()
        .skip(HEADER_LINE_COUNT)
        .map(|line| line.trim_end())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Split the one-character marker from an entry
fn split_marker(line: &str) -> (char, &str) {
    let mut chars = line.chars();
    match chars.next() {
        Some(marker) => (marker, chars.as_str()),
        None => (' ', line),
    }
}

/// Package order and enable state from modlist lines.
///
/// Installed packages the file does not mention go to the low-priority end
/// in name order, disabled.
pub fn parse_modlist(
    lines: &[String],
    index: &PackageIndex,
    layout: &GameLayout,
    warnings: &mut Vec<ProfileWarning>,
) -> Vec<ContentPackage> {
    let mut seen = HashSet::new();
    let mut mentioned = Vec::new();

    for line in entry_lines(lines).rev() {
        let (marker, name) = split_marker(line);

        if marker == ENABLED_UNIT_MARKER && layout.is_base_package(name) {
            continue;
        }

        if !index.contains(name) {
            tracing::debug!("Dropping stale modlist entry: {}", line);
            warnings.push(ProfileWarning::StaleReference {
                file: ProfileFile::Modlist,
                entry: name.to_string(),
            });
            continue;
        }

        if seen.insert(name) {
            mentioned.push((name, marker == ENABLED_PACKAGE_MARKER));
        }
    }

    index
        .names()
        .iter()
        .filter(|name| !seen.contains(name.as_str()))
        .map(|name| (name.as_str(), false))
        .chain(mentioned)
        .enumerate()
        .map(|(priority, (name, enabled))| ContentPackage {
            name: name.to_string(),
            enabled,
            priority,
        })
        .collect()
}

/// Enabled load unit names (lowercased) from plugins lines
pub fn parse_plugins(lines: &[String]) -> Vec<String> {
    entry_lines(lines)
        .filter_map(|line| match split_marker(line) {
            (ENABLED_UNIT_MARKER, name) if !name.is_empty() => Some(name.to_lowercase()),
            _ => None,
        })
        .collect()
}

/// Every installed package disabled, in name order
pub fn default_packages(index: &PackageIndex) -> Vec<ContentPackage> {
    index
        .names()
        .iter()
        .enumerate()
        .map(|(priority, name)| ContentPackage {
            name: name.clone(),
            enabled: false,
            priority,
        })
        .collect()
}

/// Read the state of the profile in `profile_dir`.
pub async fn read_profile(
    profile_dir: &Utf8Path,
    index: &PackageIndex,
    layout: &GameLayout,
) -> Result<ProfileState> {
    let mut state = ProfileState {
        profile_dir: profile_dir.to_path_buf(),
        ..Default::default()
    };

    let modlist_path = state.file_path(ProfileFile::Modlist, layout);
    let plugins_path = state.file_path(ProfileFile::Plugins, layout);
    let loadorder_path = state.file_path(ProfileFile::Loadorder, layout);

    let (modlist, plugins, loadorder_kind) = tokio::try_join!(
        read_profile_lines(&modlist_path),
        read_profile_lines(&plugins_path),
        probe(&loadorder_path),
    )?;

    match modlist {
        Some(lines) => {
            state.has_modlist_file = true;
            state.packages = parse_modlist(&lines, index, layout, &mut state.warnings);
        }
        None => {
            tracing::warn!("Could not find {}", modlist_path);
            state
                .warnings
                .push(ProfileWarning::MissingProfileFile(ProfileFile::Modlist));
            state.packages = default_packages(index);
        }
    }

    match plugins {
        Some(lines) => {
            state.has_plugins_file = true;
            state.enabled_units.extend(parse_plugins(&lines));
        }
        None => {
            tracing::warn!("Could not find {}", plugins_path);
            state
                .warnings
                .push(ProfileWarning::MissingProfileFile(ProfileFile::Plugins));
        }
    }

    state.has_loadorder_file = loadorder_kind.is_file();
    if !state.has_loadorder_file {
        tracing::warn!("Could not find {}", loadorder_path);
        state
            .warnings
            .push(ProfileWarning::MissingProfileFile(ProfileFile::Loadorder));
    }

    tracing::debug!(
        "Read profile {}: {} mods ({} enabled), {} enabled plugins",
        profile_dir,
        state.packages.len(),
        state.packages.iter().filter(|p| p.enabled).count(),
        state.enabled_units.len()
    );

    Ok(state)
}

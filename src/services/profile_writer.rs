//! Regenerates modlist, plugins and loadorder.
//!
//! Rendering is pure (`render_*`); [`write_profile_file`] does the optional
//! backup rename followed by a single overwrite. There is no transaction
//! across the three files.

use crate::error::{Result, SyncError};
use crate::models::{GameLayout, ProfileFile, ProfileState};
use crate::services::fs_probe::probe;
use crate::services::resolver::ResolvedLoadOrder;
use camino::{Utf8Path, Utf8PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;

/// Line separator of every written profile file
pub const LINE_SEPARATOR: &str = "\r\n";

/// Infix between the original file name and the timestamp of a backup
pub const BACKUP_INFIX: &str = "_backup_";

/// Outcome of writing one profile file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub file: ProfileFile,
    pub path: Utf8PathBuf,
    pub backup: Option<Utf8PathBuf>,
    pub lines: usize,
}

/// modlist: header, every package highest priority first, then the base
/// packages.
pub fn render_modlist(state: &ProfileState, layout: &GameLayout) -> Vec<String> {
    let mut lines = Vec::with_capacity(state.packages.len() + layout.base_packages.len() + 1);
    lines.push(layout.file_header.clone());

    for package in state.packages.iter().rev() {
        let marker = if package.enabled { '+' } else { '-' };
        lines.push(format!("{marker}{}", package.name));
    }

    lines.extend(layout.base_package_lines());
    lines
}

/// plugins: header, then every resolved unit, `*`-prefixed when enabled
pub fn render_plugins(
    state: &ProfileState,
    resolved: &ResolvedLoadOrder,
    layout: &GameLayout,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(resolved.len() + 1);
    lines.push(layout.file_header.clone());

    for name in resolved.names() {
        if state.is_unit_enabled(name) {
            lines.push(format!("*{name}"));
        } else {
            lines.push(name.to_string());
        }
    }

    lines
}

/// loadorder: header, vanilla masters, then every resolved unit
pub fn render_loadorder(resolved: &ResolvedLoadOrder, layout: &GameLayout) -> Vec<String> {
    let mut lines = Vec::with_capacity(resolved.len() + layout.vanilla_masters.len() + 1);
    lines.push(layout.file_header.clone());
    lines.extend(layout.vanilla_masters.iter().cloned());
    lines.extend(resolved.names().map(str::to_string));
    lines
}

/// Join non-empty lines with CRLF, ending with a trailing CRLF
pub fn join_lines(lines: &[String]) -> String {
    let mut content = String::new();
    for line in lines.iter().filter(|line| !line.is_empty()) {
        content.push_str(line);
        content.push_str(LINE_SEPARATOR);
    }
    content
}

/// Timestamp token for backup names, unique to the millisecond
pub fn backup_timestamp(now: OffsetDateTime) -> String {
    let format = format_description!(
        "[year]-[month]-[day]_[hour]-[minute]-[second]_[subsecond digits:3]"
    );
    now.format(&format)
        .unwrap_or_else(|_| now.unix_timestamp_nanos().to_string())
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Backup path for `path`: `<name>_backup_<timestamp>` in the same directory
pub fn backup_path(path: &Utf8Path, timestamp: &str) -> Utf8PathBuf {
    let name = path.file_name().unwrap_or_default();
    let backup_name = format!("{name}{BACKUP_INFIX}{timestamp}");
    match path.parent() {
        Some(parent) => parent.join(backup_name),
        None => Utf8PathBuf::from(backup_name),
    }
}

/// Rename an existing file or directory out of the way.
///
/// Returns the backup path, or `None` when nothing was there.
pub async fn backup_existing(path: &Utf8Path) -> Result<Option<Utf8PathBuf>> {
    if !probe(path).await?.exists() {
        return Ok(None);
    }

    let target = backup_path(path, &backup_timestamp(now()));
    tokio::fs::rename(path, &target)
        .await
        .map_err(|e| SyncError::io(path, e))?;
    tracing::info!("Backed up {} to {}", path, target);
    Ok(Some(target))
}

/// Write `lines` to `path`, optionally renaming the previous file first.
pub async fn write_lines(path: &Utf8Path, lines: &[String], backup: bool) -> Result<Option<Utf8PathBuf>> {
    let backup_target = if backup {
        backup_existing(path).await?
    } else {
        None
    };

    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::io(parent, e))?;
        }
    }

    tokio::fs::write(path, join_lines(lines))
        .await
        .map_err(|e| SyncError::io(path, e))?;

    Ok(backup_target)
}

/// Write one profile file. Backup is skipped when the file did not exist
/// when the profile was read, whatever `backup` says.
pub async fn write_profile_file(
    state: &ProfileState,
    file: ProfileFile,
    lines: Vec<String>,
    backup: bool,
    layout: &GameLayout,
) -> Result<WrittenFile> {
    let path = state.file_path(file, layout);
    let backup = backup && state.has_file(file);

    let backup_target = write_lines(&path, &lines, backup).await?;
    tracing::info!("Wrote {} ({} lines)", path, lines.len());

    Ok(WrittenFile {
        file,
        path,
        backup: backup_target,
        lines: lines.len(),
    })
}

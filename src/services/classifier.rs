//! Load unit classification from extension and record flags.
//!
//! The record flag word is the third 32-bit word of the file header (byte
//! offset 8), stored little-endian. Classification depends only on the
//! extension and that word, so a `.esp` flagged as master is treated as a
//! master and a `.esm` flagged light is treated as a light master.
//!
//! # Examples
//!
//! ```
//! use mo2sync::models::{GameLayout, LoadUnitKind};
//! use mo2sync::services::classifier::{classify, LoadUnitExtension, LIGHT_FLAG};
//!
//! let layout = GameLayout::default();
//! let ext = LoadUnitExtension::from_file_name("Patch.esm", &layout).unwrap();
//! assert_eq!(classify(ext, LIGHT_FLAG), LoadUnitKind::LightMaster);
//! ```

use crate::error::{Result, SyncError};
use crate::models::{GameLayout, LoadUnitKind, layout::has_extension};
use camino::Utf8Path;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Record flag marking a master file
pub const MASTER_FLAG: u32 = 0x0000_0001;

/// Record flag marking a light master file
pub const LIGHT_FLAG: u32 = 0x0000_0200;

/// Byte offset of the record flag word
pub const RECORD_FLAGS_OFFSET: u64 = 8;

/// Minimum header size needed to read the flag word
pub const MIN_HEADER_SIZE: u64 = RECORD_FLAGS_OFFSET + 4;

/// Which of the three recognized extensions a file carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadUnitExtension {
    Master,
    Plugin,
    Light,
}

impl LoadUnitExtension {
    pub fn from_file_name(file_name: &str, layout: &GameLayout) -> Option<Self> {
        if has_extension(file_name, &layout.master_extension) {
            Some(Self::Master)
        } else if has_extension(file_name, &layout.plugin_extension) {
            Some(Self::Plugin)
        } else if has_extension(file_name, &layout.light_extension) {
            Some(Self::Light)
        } else {
            None
        }
    }
}

pub fn is_treated_as_master(ext: LoadUnitExtension, flags: u32) -> bool {
    (ext == LoadUnitExtension::Master && flags != LIGHT_FLAG)
        || (ext == LoadUnitExtension::Plugin && flags == MASTER_FLAG)
}

pub fn is_treated_as_plugin(ext: LoadUnitExtension, flags: u32) -> bool {
    ext == LoadUnitExtension::Plugin && flags != MASTER_FLAG && flags != LIGHT_FLAG
}

pub fn is_treated_as_light_master(ext: LoadUnitExtension, flags: u32) -> bool {
    (ext == LoadUnitExtension::Master && flags == LIGHT_FLAG)
        || (ext == LoadUnitExtension::Light && flags == MASTER_FLAG)
}

// The `.esl` branch is the same test as in `is_treated_as_light_master`.
// `classify` checks light master first, so that branch never yields
// `LightPlugin`.
pub fn is_treated_as_light_plugin(ext: LoadUnitExtension, flags: u32) -> bool {
    (ext == LoadUnitExtension::Plugin && flags == LIGHT_FLAG)
        || (ext == LoadUnitExtension::Light && flags == MASTER_FLAG)
}

/// Classify a load unit. Rules are checked in the order master, plugin,
/// light master, light plugin; the first match wins.
pub fn classify(ext: LoadUnitExtension, flags: u32) -> LoadUnitKind {
    if is_treated_as_master(ext, flags) {
        LoadUnitKind::Master
    } else if is_treated_as_plugin(ext, flags) {
        LoadUnitKind::Plugin
    } else if is_treated_as_light_master(ext, flags) {
        LoadUnitKind::LightMaster
    } else if is_treated_as_light_plugin(ext, flags) {
        LoadUnitKind::LightPlugin
    } else {
        LoadUnitKind::Other
    }
}

/// Read the record flag word of a content file.
///
/// Fails with [`SyncError::ReadError`] when the file cannot be opened or
/// is shorter than [`MIN_HEADER_SIZE`].
pub async fn read_record_flags(path: &Utf8Path) -> Result<u32> {
    let read_error = |reason: String| SyncError::ReadError {
        path: path.to_path_buf(),
        reason,
    };

    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| read_error(e.to_string()))?;
    file.seek(std::io::SeekFrom::Start(RECORD_FLAGS_OFFSET))
        .await
        .map_err(|e| read_error(e.to_string()))?;

    let mut word = [0u8; 4];
    file.read_exact(&mut word).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            read_error(format!("shorter than {MIN_HEADER_SIZE} bytes"))
        } else {
            read_error(e.to_string())
        }
    })?;

    Ok(u32::from_le_bytes(word))
}

/// Classify the file at `path`. Files without a recognized extension are
/// [`LoadUnitKind::Other`] and are not opened.
pub async fn classify_file(path: &Utf8Path, layout: &GameLayout) -> Result<LoadUnitKind> {
    let Some(ext) = path
        .file_name()
        .and_then(|name| LoadUnitExtension::from_file_name(name, layout))
    else {
        return Ok(LoadUnitKind::Other);
    };

    let flags = read_record_flags(path).await?;
    let kind = classify(ext, flags);
    tracing::debug!("Classified {} (flags {:#010x}) as {:?}", path, flags, kind);
    Ok(kind)
}

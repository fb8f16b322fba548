//! Data models for mo2sync.
//!
//! - [`SyncConfig`]: tool settings loaded from `mo2sync.yaml`
//! - [`InstallationSettings`]: directories and selected profile read from `ModOrganizer.ini`
//! - [`GameLayout`]: base game masters, base packages and profile file conventions
//! - [`ProfileState`]: one profile's packages and enabled load units, rebuilt on every run

pub mod config;
pub mod layout;
pub mod profile;

pub use config::{InstallationSettings, SyncConfig, SyncOptions, SyncScope};
pub use layout::{DEFAULT_FILE_HEADER, GameLayout};
pub use profile::{
    ContentPackage, LoadUnit, LoadUnitKind, ProfileFile, ProfileState, ProfileWarning,
};

// mo2sync - Mod Organizer 2 profile synchronization
//
// Library crate with the synchronization pipeline and data structures.
// The binary crate (main.rs) provides the command line entry point.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::{ConfigManager, load_installation_settings};
pub use error::{Result, SyncError};
pub use models::{GameLayout, InstallationSettings, SyncConfig, SyncOptions, SyncScope};
pub use services::{ProfileReport, ProfileSynchronizer, SyncReport, sync_by_config};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

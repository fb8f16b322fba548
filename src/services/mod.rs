//! Services module - Profile synchronization for Mod Organizer 2 installations.
//!
//! Every run rebuilds each profile's state from disk and regenerates its
//! modlist, plugins and loadorder files. The services have no UI dependency
//! and take all inputs as explicit parameters.
//!
//! # Components
//!
//! - [`PackageIndex`]: name-ordered index of installed mod directories, built once per run
//! - [`profile_reader`]: parses modlist and plugins into a [`ProfileState`](crate::models::ProfileState)
//! - [`resolver`]: walks enabled mods and produces the deduplicated third-party load order
//! - [`classifier`]: reads the record flags of a plugin header to classify it
//! - [`profile_writer`]: renders and writes the three profile files with optional backups
//! - [`ProfileSynchronizer`]: runs the pipeline for the selected profile or all profiles
//!
//! # Usage Example
//!
//! ```ignore
//! use camino::Utf8Path;
//! use mo2sync::config::load_installation_settings;
//! use mo2sync::models::SyncOptions;
//! use mo2sync::services::ProfileSynchronizer;
//!
//! let settings = load_installation_settings(Utf8Path::new("C:/Modding/MO2"))?;
//! let synchronizer = ProfileSynchronizer::new(settings, SyncOptions::default()).await?;
//!
//! let report = synchronizer.sync_all().await?;
//! for profile in &report.profiles {
//!     println!("{}", profile.summary());
//! }
//! ```
//!
//! # Failure model
//!
//! Missing installation directories are fatal ([`SyncError::NotFound`](crate::error::SyncError)).
//! Missing profile files, stale entries and unreadable plugin headers are
//! recovered and surface as warnings on the [`ProfileReport`].

pub mod classifier;
pub mod fs_probe;
pub mod package_index;
pub mod profile_reader;
pub mod profile_writer;
pub mod resolver;
pub mod sync;

pub use classifier::{LoadUnitExtension, classify, classify_file, read_record_flags};
pub use package_index::{PackageIndex, compare_names};
pub use profile_reader::read_profile;
pub use profile_writer::WrittenFile;
pub use resolver::{ResolvedLoadOrder, resolve};
pub use sync::{
    ProfileFailure, ProfileReport, ProfileSynchronizer, SyncReport, sync_by_config,
};

//! Runs reader, resolver and writer over one or all profiles.
//!
//! The package index is built once per installation and shared by every
//! profile task. Profiles run concurrently when the whole installation is
//! synchronized; one failing profile does not stop the others.

use crate::config::load_installation_settings;
use crate::error::{Result, SyncError};
use crate::metrics::SyncMetrics;
use crate::models::{
    GameLayout, InstallationSettings, ProfileFile, ProfileWarning, SyncConfig, SyncOptions,
    SyncScope,
};
use crate::services::fs_probe::require_dir;
use crate::services::package_index::{PackageIndex, sort_names};
use crate::services::profile_reader::read_profile;
use crate::services::profile_writer::{
    WrittenFile, render_loadorder, render_modlist, render_plugins, write_profile_file,
};
use crate::services::resolver::{installed_unit_names, resolve};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Outcome of synchronizing one profile
#[derive(Debug, Clone)]
pub struct ProfileReport {
    pub name: String,
    pub profile_dir: Utf8PathBuf,
    pub files: Vec<WrittenFile>,
    pub warnings: Vec<ProfileWarning>,
    /// Load units written to plugins and loadorder
    pub units: usize,
    pub duplicates_dropped: usize,
}

impl ProfileReport {
    pub fn backups(&self) -> impl Iterator<Item = &Utf8Path> {
        self.files.iter().filter_map(|file| file.backup.as_deref())
    }

    pub fn written(&self, file: ProfileFile) -> Option<&WrittenFile> {
        self.files.iter().find(|written| written.file == file)
    }

    /// One-line summary for console output
    pub fn summary(&self) -> String {
        format!(
            "{}: {} files written, {} backups, {} plugins, {} warnings",
            self.name,
            self.files.len(),
            self.backups().count(),
            self.units,
            self.warnings.len()
        )
    }
}

/// A profile that could not be synchronized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFailure {
    pub name: String,
    pub message: String,
}

/// Outcome of a run over one or more profiles
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub profiles: Vec<ProfileReport>,
    pub failures: Vec<ProfileFailure>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn profile(&self, name: &str) -> Option<&ProfileReport> {
        self.profiles.iter().find(|report| report.name == name)
    }
}

fn profile_name(profile_dir: &Utf8Path) -> String {
    profile_dir
        .file_name()
        .unwrap_or(profile_dir.as_str())
        .to_string()
}

/// Synchronize a single profile directory against `index`.
async fn sync_profile_dir(
    profile_dir: &Utf8Path,
    index: &PackageIndex,
    layout: &GameLayout,
    options: SyncOptions,
    metrics: &SyncMetrics,
) -> Result<ProfileReport> {
    let started = Instant::now();
    let name = profile_name(profile_dir);
    tracing::info!("Synchronizing profile '{}'", name);

    require_dir(profile_dir).await?;

    let mut state = read_profile(profile_dir, index, layout).await?;
    if options.sort_by_name {
        state.sort_packages_by_name();
    }

    let modlist_lines = render_modlist(&state, layout);

    let mut warnings = std::mem::take(&mut state.warnings);
    let mut units = 0;
    let mut duplicates_dropped = 0;

    let files = if options.sync_plugins {
        let resolved = resolve(
            &state.enabled_packages(),
            index.mod_directory(),
            options.sort_by_name,
            layout,
        )
        .await?;

        let unresolved: Vec<&String> = state
            .enabled_units
            .iter()
            .filter(|unit| !resolved.contains(unit) && !layout.is_vanilla_master(unit))
            .collect();

        if !unresolved.is_empty() {
            let disabled: Vec<String> = state
                .packages
                .iter()
                .filter(|package| !package.enabled)
                .map(|package| package.name.clone())
                .collect();
            let demoted = installed_unit_names(&disabled, index.mod_directory(), layout).await?;

            for unit in unresolved {
                if demoted.contains(unit) {
                    tracing::debug!("Enabled plugin {} belongs to a disabled mod", unit);
                    continue;
                }
                warnings.push(ProfileWarning::StaleReference {
                    file: ProfileFile::Plugins,
                    entry: unit.clone(),
                });
            }
        }

        let plugins_lines = render_plugins(&state, &resolved, layout);
        let loadorder_lines = render_loadorder(&resolved, layout);

        let (modlist, plugins, loadorder) = tokio::try_join!(
            write_profile_file(&state, ProfileFile::Modlist, modlist_lines, options.backup, layout),
            write_profile_file(&state, ProfileFile::Plugins, plugins_lines, options.backup, layout),
            write_profile_file(
                &state,
                ProfileFile::Loadorder,
                loadorder_lines,
                options.backup,
                layout
            ),
        )?;

        units = resolved.len();
        duplicates_dropped = resolved.duplicates_dropped;
        warnings.extend(resolved.warnings);

        vec![modlist, plugins, loadorder]
    } else {
        let modlist = write_profile_file(
            &state,
            ProfileFile::Modlist,
            modlist_lines,
            options.backup,
            layout,
        )
        .await?;
        vec![modlist]
    };

    for file in &files {
        metrics.record_file_written(file.backup.is_some());
    }
    metrics.record_units(units, duplicates_dropped);
    for warning in &warnings {
        match warning {
            ProfileWarning::MissingProfileFile(_) => metrics.record_missing_file(),
            ProfileWarning::StaleReference { .. } => {
                tracing::warn!("[{}] {}", name, warning);
                metrics.record_stale_entry();
            }
            ProfileWarning::UnclassifiedUnit { .. } => metrics.record_unclassified_unit(),
        }
    }
    metrics.record_profile_synced(started.elapsed());

    tracing::info!(
        "Profile '{}' synchronized in {:.2}s",
        name,
        started.elapsed().as_secs_f64()
    );

    Ok(ProfileReport {
        name,
        profile_dir: profile_dir.to_path_buf(),
        files,
        warnings,
        units,
        duplicates_dropped,
    })
}

/// Synchronizes the profiles of one Mod Organizer 2 installation
#[derive(Debug, Clone)]
pub struct ProfileSynchronizer {
    settings: InstallationSettings,
    options: SyncOptions,
    layout: Arc<GameLayout>,
    index: Arc<PackageIndex>,
    metrics: Arc<SyncMetrics>,
}

impl ProfileSynchronizer {
    /// Index the installed packages of `settings` for the default layout.
    ///
    /// Fails with [`SyncError::NotFound`] when the mod directory or the
    /// profiles directory is missing.
    pub async fn new(settings: InstallationSettings, options: SyncOptions) -> Result<Self> {
        Self::with_layout(settings, options, GameLayout::default()).await
    }

    pub async fn with_layout(
        settings: InstallationSettings,
        options: SyncOptions,
        layout: GameLayout,
    ) -> Result<Self> {
        require_dir(&settings.profiles_directory).await?;
        let index = PackageIndex::build(&settings.mod_directory).await?;

        Ok(Self {
            settings,
            options,
            layout: Arc::new(layout),
            index: Arc::new(index),
            metrics: Arc::new(SyncMetrics::new()),
        })
    }

    pub fn settings(&self) -> &InstallationSettings {
        &self.settings
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    pub fn index(&self) -> &PackageIndex {
        &self.index
    }

    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    /// Synchronize the profile stored in `profile_dir`
    pub async fn sync_profile(&self, profile_dir: &Utf8Path) -> Result<ProfileReport> {
        let result = sync_profile_dir(
            profile_dir,
            &self.index,
            &self.layout,
            self.options,
            &self.metrics,
        )
        .await;
        if result.is_err() {
            self.metrics.record_profile_failed();
        }
        result
    }

    /// Synchronize the profile selected in Mod Organizer 2
    pub async fn sync_selected(&self) -> Result<SyncReport> {
        if self.settings.selected_profile.is_empty() {
            return Err(SyncError::InvalidSettings(format!(
                "no selected_profile in {}",
                self.settings.settings_file
            )));
        }

        let profile_dir = self.settings.selected_profile_dir();
        require_dir(&profile_dir).await?;

        let report = self.sync_profile(&profile_dir).await?;
        Ok(SyncReport {
            profiles: vec![report],
            failures: Vec::new(),
        })
    }

    /// Profile directories under the profiles directory, in name order
    pub async fn list_profiles(&self) -> Result<Vec<Utf8PathBuf>> {
        let profiles_dir = &self.settings.profiles_directory;
        let mut entries = tokio::fs::read_dir(profiles_dir)
            .await
            .map_err(|e| SyncError::io(profiles_dir, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SyncError::io(profiles_dir, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| SyncError::io(profiles_dir, e))?;
            if !file_type.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => tracing::warn!("Skipping profile with non UTF-8 name: {:?}", raw),
            }
        }

        sort_names(&mut names);
        Ok(names.iter().map(|name| profiles_dir.join(name)).collect())
    }

    /// Synchronize every profile, one task per profile
    pub async fn sync_all(&self) -> Result<SyncReport> {
        let profile_dirs = self.list_profiles().await?;
        tracing::info!("Synchronizing {} profiles", profile_dirs.len());

        let mut tasks = JoinSet::new();
        for profile_dir in profile_dirs {
            let index = Arc::clone(&self.index);
            let layout = Arc::clone(&self.layout);
            let metrics = Arc::clone(&self.metrics);
            let options = self.options;

            tasks.spawn(async move {
                let name = profile_name(&profile_dir);
                let result =
                    sync_profile_dir(&profile_dir, &index, &layout, options, &metrics).await;
                (name, result)
            });
        }

        let mut report = SyncReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(profile))) => report.profiles.push(profile),
                Ok((name, Err(e))) => {
                    tracing::error!("Failed to synchronize profile '{}': {}", name, e);
                    self.metrics.record_profile_failed();
                    report.failures.push(ProfileFailure {
                        name,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    let e = SyncError::Task(e.to_string());
                    tracing::error!("{}", e);
                    self.metrics.record_profile_failed();
                    report.failures.push(ProfileFailure {
                        name: String::new(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report.profiles.sort_by(|a, b| a.name.cmp(&b.name));
        report.failures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(report)
    }

    /// Synchronize the profiles `scope` names
    pub async fn sync_scope(&self, scope: SyncScope) -> Result<SyncReport> {
        match scope {
            SyncScope::SelectedProfile => self.sync_selected().await,
            SyncScope::AllProfiles => self.sync_all().await,
        }
    }
}

/// Load the installation named by `config` and synchronize its `scope`.
pub async fn sync_by_config(config: &SyncConfig) -> anyhow::Result<SyncReport> {
    let settings = load_installation_settings(&config.installation)?;

    let synchronizer =
        ProfileSynchronizer::with_layout(settings, SyncOptions::from(config), config.game.clone())
            .await
            .context("Failed to open Mod Organizer installation")?;

    let report = synchronizer.sync_scope(config.scope).await?;
    synchronizer.metrics().log_summary();
    Ok(report)
}

use crate::models::GameLayout;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Which profiles a run touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncScope {
    #[default]
    SelectedProfile,
    AllProfiles,
}

/// Tool configuration from mo2sync.yaml
///
/// Built once per run and passed by reference (or `Arc`) to every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// `ModOrganizer.ini`, or the Mod Organizer 2 installation directory
    /// containing it
    #[serde(default)]
    pub installation: Utf8PathBuf,

    #[serde(default)]
    pub scope: SyncScope,

    /// Rename existing profile files to a timestamped backup before writing
    #[serde(default = "default_true")]
    pub backup: bool,

    /// Order packages by name instead of by their modlist priority
    #[serde(default = "default_true")]
    pub sort_by_name: bool,

    /// Rebuild plugins and loadorder. When false only modlist is rewritten.
    #[serde(default = "default_true")]
    pub sync_plugins: bool,

    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default)]
    pub game: GameLayout,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            installation: Utf8PathBuf::new(),
            scope: SyncScope::default(),
            backup: true,
            sort_by_name: true,
            sync_plugins: true,
            debug_mode: false,
            game: GameLayout::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Per-run switches handed to the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub backup: bool,
    pub sort_by_name: bool,
    pub sync_plugins: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            backup: true,
            sort_by_name: true,
            sync_plugins: true,
        }
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            backup: config.backup,
            sort_by_name: config.sort_by_name,
            sync_plugins: config.sync_plugins,
        }
    }
}

/// Directories and selected profile resolved from `ModOrganizer.ini`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationSettings {
    pub settings_file: Utf8PathBuf,
    pub mod_directory: Utf8PathBuf,
    pub profiles_directory: Utf8PathBuf,
    pub selected_profile: String,
}

impl InstallationSettings {
    pub fn selected_profile_dir(&self) -> Utf8PathBuf {
        self.profiles_directory.join(&self.selected_profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_config_defaults() {
        let config = SyncConfig::default();
        assert!(config.backup);
        assert!(config.sort_by_name);
        assert!(config.sync_plugins);
        assert!(!config.debug_mode);
        assert_eq!(config.scope, SyncScope::SelectedProfile);
    }

    #[test]
    fn test_sync_config_from_partial_yaml() {
        let yaml = "installation: D:/MO2\nscope: all_profiles\nbackup: false\n";
        let config: SyncConfig = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(config.installation, Utf8PathBuf::from("D:/MO2"));
        assert_eq!(config.scope, SyncScope::AllProfiles);
        assert!(!config.backup);
        assert!(config.sort_by_name);
        assert_eq!(config.game, GameLayout::default());
    }

    #[test]
    fn test_options_from_config() {
        let config = SyncConfig {
            sync_plugins: false,
            ..Default::default()
        };
        let options = SyncOptions::from(&config);
        assert!(!options.sync_plugins);
        assert!(options.backup);
    }

    #[test]
    fn test_selected_profile_dir() {
        let settings = InstallationSettings {
            settings_file: Utf8PathBuf::from("MO2/ModOrganizer.ini"),
            mod_directory: Utf8PathBuf::from("MO2/mods"),
            profiles_directory: Utf8PathBuf::from("MO2/profiles"),
            selected_profile: "Default".to_string(),
        };
        assert_eq!(
            settings.selected_profile_dir(),
            Utf8PathBuf::from("MO2/profiles/Default")
        );
    }
}

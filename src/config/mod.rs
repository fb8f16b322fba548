use crate::error::SyncError;
use crate::models::{InstallationSettings, SyncConfig};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde::Deserialize;
use std::fs;

/// File name of the Mod Organizer 2 settings file
pub const SETTINGS_FILE_NAME: &str = "ModOrganizer.ini";

/// File name of the tool configuration
pub const SYNC_CONFIG_FILE_NAME: &str = "mo2sync.yaml";

/// Placeholder Mod Organizer 2 expands to the base directory
const BASE_DIR_PLACEHOLDER: &str = "%BASE_DIR%";

/// Configuration manager for loading and saving the YAML tool configuration.
///
/// The installation settings (`ModOrganizer.ini`) are read with
/// [`load_installation_settings`]; they belong to Mod Organizer 2 and are
/// never written.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    sync_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing `mo2sync.yaml`
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.as_str().is_empty() && !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            sync_config_path: config_dir.join(SYNC_CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Create a ConfigManager for an explicit configuration file path.
    pub fn for_file<P: AsRef<Utf8Path>>(config_file: P) -> Result<Self> {
        let config_file = config_file.as_ref();
        let config_dir = config_file
            .parent()
            .map(Utf8Path::to_path_buf)
            .unwrap_or_default();
        let mut manager = Self::new(&config_dir)?;
        manager.sync_config_path = config_file.to_path_buf();
        Ok(manager)
    }

    /// Load the tool configuration.
    ///
    /// # Returns
    /// The loaded SyncConfig, or default if file doesn't exist
    pub fn load_sync_config(&self) -> Result<SyncConfig> {
        if !self.sync_config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.sync_config_path
            );
            return Ok(SyncConfig::default());
        }

        let file_contents = fs::read_to_string(&self.sync_config_path)
            .with_context(|| format!("Failed to read config: {}", self.sync_config_path))?;

        let config: SyncConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse config: {}", self.sync_config_path))?;

        tracing::info!("Loaded config from {}", self.sync_config_path);
        Ok(config)
    }

    /// Save the tool configuration.
    pub fn save_sync_config(&self, config: &SyncConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.sync_config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.sync_config_path))?;

        tracing::info!("Saved config to {}", self.sync_config_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the configuration file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.sync_config_path
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawInstallationIni {
    #[serde(rename = "Settings", alias = "settings", default)]
    settings: RawSettingsSection,

    #[serde(rename = "General", alias = "general", default)]
    general: RawGeneralSection,
}

#[derive(Debug, Default, Deserialize)]
struct RawSettingsSection {
    #[serde(default)]
    base_directory: Option<String>,
    #[serde(default)]
    mod_directory: Option<String>,
    #[serde(default)]
    profiles_directory: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGeneralSection {
    #[serde(default)]
    selected_profile: Option<String>,
}

/// Locate `ModOrganizer.ini` from either the file itself or its directory
pub fn resolve_settings_file(installation: &Utf8Path) -> Utf8PathBuf {
    if installation.is_dir() {
        installation.join(SETTINGS_FILE_NAME)
    } else {
        installation.to_path_buf()
    }
}

/// Keep only the keys of `[General]` and `[Settings]` this tool reads.
///
/// Other sections hold Qt-encoded values (`@ByteArray(\x1...)`, `@Variant`)
/// that are not valid INI escapes.
pub fn relevant_ini_lines(contents: &str) -> String {
    const KEYS: [&str; 4] = [
        "base_directory",
        "mod_directory",
        "profiles_directory",
        "selected_profile",
    ];

    let mut in_relevant_section = false;
    let mut filtered = String::new();

    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let section = &trimmed[1..trimmed.len() - 1];
            in_relevant_section =
                section.eq_ignore_ascii_case("General") || section.eq_ignore_ascii_case("Settings");
            if in_relevant_section {
                filtered.push_str(trimmed);
                filtered.push('\n');
            }
            continue;
        }

        if !in_relevant_section {
            continue;
        }

        let key = trimmed.split('=').next().unwrap_or_default().trim();
        if KEYS.contains(&key) {
            filtered.push_str(trimmed);
            filtered.push('\n');
        }
    }

    filtered
}

/// Strip the `@ByteArray(...)` wrapper Mod Organizer 2 stores strings in
pub fn unwrap_byte_array(value: &str) -> Result<String> {
    let marker = Regex::new(r"^@ByteArray\((.*)\)$").context("Invalid @ByteArray regex")?;
    let value = value.trim();
    Ok(marker
        .captures(value)
        .and_then(|captures| captures.get(1))
        .map_or(value, |inner| inner.as_str())
        .to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn expand_base_dir(value: &str, base_dir: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(value.replace(BASE_DIR_PLACEHOLDER, base_dir.as_str()))
}

/// Parse installation settings from `ModOrganizer.ini` contents.
///
/// `installation_dir` is the directory holding the file; it is the base
/// directory unless `base_directory` says otherwise.
pub fn parse_installation_settings(
    contents: &str,
    settings_file: &Utf8Path,
    installation_dir: &Utf8Path,
) -> Result<InstallationSettings> {
    let filtered = relevant_ini_lines(contents);

    let raw: RawInstallationIni = config::Config::builder()
        .add_source(config::File::from_str(&filtered, config::FileFormat::Ini))
        .build()
        .and_then(|built| built.try_deserialize())
        .map_err(|e| SyncError::InvalidSettings(format!("{settings_file}: {e}")))?;

    let base_dir = non_empty(raw.settings.base_directory)
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| installation_dir.to_path_buf());

    let mod_directory = non_empty(raw.settings.mod_directory)
        .unwrap_or_else(|| format!("{BASE_DIR_PLACEHOLDER}/mods"));
    let profiles_directory = non_empty(raw.settings.profiles_directory)
        .unwrap_or_else(|| format!("{BASE_DIR_PLACEHOLDER}/profiles"));

    let selected_profile = match non_empty(raw.general.selected_profile) {
        Some(value) => unwrap_byte_array(&value)?,
        None => String::new(),
    };

    Ok(InstallationSettings {
        settings_file: settings_file.to_path_buf(),
        mod_directory: expand_base_dir(&mod_directory, &base_dir),
        profiles_directory: expand_base_dir(&profiles_directory, &base_dir),
        selected_profile,
    })
}

/// Read `ModOrganizer.ini` of an installation.
///
/// `installation` is the settings file or the directory containing it. A
/// missing file is [`SyncError::NotFound`].
pub fn load_installation_settings(installation: &Utf8Path) -> Result<InstallationSettings> {
    let settings_file = resolve_settings_file(installation);
    if !settings_file.is_file() {
        return Err(SyncError::NotFound(settings_file).into());
    }

    let installation_dir = settings_file
        .parent()
        .map(Utf8Path::to_path_buf)
        .unwrap_or_default();

    let contents = fs::read_to_string(&settings_file)
        .with_context(|| format!("Failed to read settings: {}", settings_file))?;

    let settings = parse_installation_settings(&contents, &settings_file, &installation_dir)?;

    tracing::info!("Mod directory: {}", settings.mod_directory);
    tracing::info!("Profiles directory: {}", settings.profiles_directory);
    tracing::info!("Selected profile: {}", settings.selected_profile);

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_load_save_sync_config() {
        let (manager, _temp_dir) = create_test_config_manager();

        let config = SyncConfig {
            backup: false,
            ..Default::default()
        };
        manager.save_sync_config(&config).unwrap();

        let loaded = manager.load_sync_config().unwrap();
        assert!(!loaded.backup);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_sync_config_uses_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();
        let loaded = manager.load_sync_config().unwrap();
        assert_eq!(loaded, SyncConfig::default());
    }

    #[test]
    fn test_unwrap_byte_array() {
        assert_eq!(unwrap_byte_array("@ByteArray(Default)").unwrap(), "Default");
        assert_eq!(
            unwrap_byte_array("@ByteArray(My (Test) Profile)").unwrap(),
            "My (Test) Profile"
        );
        assert_eq!(unwrap_byte_array("Plain").unwrap(), "Plain");
    }

    #[test]
    fn test_relevant_ini_lines() {
        let contents = "[General]\r\nselected_profile=@ByteArray(Default)\r\ngeometry=@ByteArray(\\x1\\xd9)\r\n[Settings]\r\nmod_directory=D:/mods\r\n[Plugins]\r\nmod_directory=ignored\r\n";
        let filtered = relevant_ini_lines(contents);
        assert_eq!(
            filtered,
            "[General]\nselected_profile=@ByteArray(Default)\n[Settings]\nmod_directory=D:/mods\n"
        );
    }

    #[test]
    fn test_parse_installation_settings() {
        let contents = "[General]\nselected_profile=@ByteArray(Z_Profile)\n\n[Settings]\nmod_directory=D:/TES/SE_mods\nprofiles_directory=D:/TES/SE_Data/profiles\n";
        let settings = parse_installation_settings(
            contents,
            Utf8Path::new("D:/MO2/ModOrganizer.ini"),
            Utf8Path::new("D:/MO2"),
        )
        .unwrap();

        assert_eq!(settings.mod_directory, Utf8PathBuf::from("D:/TES/SE_mods"));
        assert_eq!(
            settings.profiles_directory,
            Utf8PathBuf::from("D:/TES/SE_Data/profiles")
        );
        assert_eq!(settings.selected_profile, "Z_Profile");
    }

    #[test]
    fn test_parse_installation_settings_defaults_to_base_dir() {
        let contents = "[General]\nselected_profile=@ByteArray(Default)\n";
        let settings = parse_installation_settings(
            contents,
            Utf8Path::new("MO2/ModOrganizer.ini"),
            Utf8Path::new("MO2"),
        )
        .unwrap();

        assert_eq!(settings.mod_directory, Utf8PathBuf::from("MO2/mods"));
        assert_eq!(settings.profiles_directory, Utf8PathBuf::from("MO2/profiles"));
    }

    #[test]
    fn test_parse_installation_settings_expands_base_dir() {
        let contents = "[Settings]\nbase_directory=E:/Portable\nmod_directory=%BASE_DIR%/my mods\n";
        let settings = parse_installation_settings(
            contents,
            Utf8Path::new("MO2/ModOrganizer.ini"),
            Utf8Path::new("MO2"),
        )
        .unwrap();

        assert_eq!(settings.mod_directory, Utf8PathBuf::from("E:/Portable/my mods"));
        assert_eq!(
            settings.profiles_directory,
            Utf8PathBuf::from("E:/Portable/profiles")
        );
        assert_eq!(settings.selected_profile, "");
    }

    #[test]
    fn test_missing_settings_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();

        let err = load_installation_settings(&root).unwrap_err();
        let sync_err = err.downcast_ref::<SyncError>().unwrap();
        assert!(matches!(sync_err, SyncError::NotFound(_)));
    }
}

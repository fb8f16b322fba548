//! Integration tests for whole-profile synchronization
//!
//! These tests build a throwaway Mod Organizer 2 installation on disk and
//! verify:
//! - modlist ordering, enable state and unreferenced mods
//! - plugins enable state round-trip and demotion
//! - last-mod-wins deduplication of plugins
//! - missing profile files and backup behaviour
//! - idempotence of repeated runs

use camino::Utf8PathBuf;
use mo2sync::models::{
    DEFAULT_FILE_HEADER, InstallationSettings, ProfileFile, ProfileWarning, SyncOptions,
};
use mo2sync::services::resolver::resolve;
use mo2sync::{ProfileSynchronizer, SyncConfig, SyncScope, sync_by_config};
use std::fs;
use tempfile::TempDir;

struct Installation {
    _temp_dir: TempDir,
    root: Utf8PathBuf,
}

impl Installation {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        fs::create_dir_all(root.join("mods")).unwrap();
        fs::create_dir_all(root.join("profiles/Default")).unwrap();
        fs::write(
            root.join("ModOrganizer.ini"),
            "[General]\r\nselected_profile=@ByteArray(Default)\r\n",
        )
        .unwrap();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    fn settings(&self) -> InstallationSettings {
        InstallationSettings {
            settings_file: self.root.join("ModOrganizer.ini"),
            mod_directory: self.root.join("mods"),
            profiles_directory: self.root.join("profiles"),
            selected_profile: "Default".to_string(),
        }
    }

    fn profile(&self) -> Utf8PathBuf {
        self.root.join("profiles/Default")
    }

    fn add_mod(&self, name: &str, units: &[&str]) {
        let dir = self.root.join("mods").join(name);
        fs::create_dir_all(&dir).unwrap();
        for unit in units {
            let mut header = b"TES4".to_vec();
            header.extend_from_slice(&[0u8; 20]);
            fs::write(dir.join(unit), header).unwrap();
        }
    }

    fn write_profile_file(&self, name: &str, entries: &[&str]) {
        let mut content = format!("{DEFAULT_FILE_HEADER}\r\n");
        for entry in entries {
            content.push_str(entry);
            content.push_str("\r\n");
        }
        fs::write(self.profile().join(name), content).unwrap();
    }

    fn read_entries(&self, name: &str) -> Vec<String> {
        let content = fs::read_to_string(self.profile().join(name)).unwrap();
        let mut lines = content.split("\r\n");
        assert_eq!(lines.next(), Some(DEFAULT_FILE_HEADER));
        lines
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn backups(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.profile())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .filter(|name| name.contains("_backup_"))
            .collect();
        names.sort();
        names
    }

    async fn sync(&self, options: SyncOptions) -> mo2sync::ProfileReport {
        let synchronizer = ProfileSynchronizer::new(self.settings(), options)
            .await
            .unwrap();
        synchronizer.sync_profile(&self.profile()).await.unwrap()
    }
}

fn no_backup() -> SyncOptions {
    SyncOptions {
        backup: false,
        ..Default::default()
    }
}

const BASE_LINES: [&str; 3] = ["*DLC: Dragonborn", "*DLC: HearthFires", "*DLC: Dawnguard"];

#[tokio::test]
async fn test_modlist_written_back_in_reverse_priority() {
    let install = Installation::new();
    install.add_mod("ModA", &["A.esp"]);
    install.add_mod("ModB", &["B.esp"]);
    install.write_profile_file("modlist.txt", &["+ModA", "-ModB"]);

    install.sync(no_backup()).await;

    let mut expected = vec!["-ModB".to_string(), "+ModA".to_string()];
    expected.extend(BASE_LINES.iter().map(|s| s.to_string()));
    assert_eq!(install.read_entries("modlist.txt"), expected);

    // Only ModA is enabled, so only its plugin is listed
    assert_eq!(install.read_entries("plugins.txt"), vec!["A.esp"]);
}

#[tokio::test]
async fn test_missing_plugins_file_is_recovered_without_backup() {
    let install = Installation::new();
    install.add_mod("ModA", &["A.esp"]);
    install.write_profile_file("modlist.txt", &["+ModA"]);
    install.write_profile_file("loadorder.txt", &["Skyrim.esm"]);

    let report = install.sync(SyncOptions::default()).await;

    assert!(
        report
            .warnings
            .contains(&ProfileWarning::MissingProfileFile(ProfileFile::Plugins))
    );
    let plugins = report.written(ProfileFile::Plugins).unwrap();
    assert_eq!(plugins.backup, None);

    // Enabled set was empty, so nothing is starred
    assert_eq!(install.read_entries("plugins.txt"), vec!["A.esp"]);

    // modlist and loadorder existed and were backed up
    let backups = install.backups();
    assert_eq!(backups.len(), 2);
    assert!(backups.iter().any(|name| name.starts_with("modlist.txt_backup_")));
    assert!(backups.iter().any(|name| name.starts_with("loadorder.txt_backup_")));
}

#[tokio::test]
async fn test_shared_plugin_attributed_to_higher_priority_mod() {
    let install = Installation::new();
    install.add_mod("Low", &["Shared.esp", "LowOnly.esp"]);
    install.add_mod("High", &["shared.ESP"]);

    let resolved = resolve(
        &["Low".to_string(), "High".to_string()],
        &install.root.join("mods"),
        false,
        &Default::default(),
    )
    .await
    .unwrap();

    let shared: Vec<_> = resolved
        .units
        .iter()
        .filter(|unit| unit.name.eq_ignore_ascii_case("shared.esp"))
        .collect();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].package, "High");
    assert_eq!(shared[0].name, "shared.ESP");
    assert_eq!(resolved.duplicates_dropped, 1);
    assert_eq!(resolved.names().collect::<Vec<_>>(), vec!["LowOnly.esp", "shared.ESP"]);
}

#[tokio::test]
async fn test_priority_order_kept_without_name_sorting() {
    let install = Installation::new();
    install.add_mod("Low", &["Shared.esp", "LowOnly.esp"]);
    install.add_mod("High", &["shared.ESP"]);
    // File order is highest priority first
    install.write_profile_file("modlist.txt", &["+High", "+Low"]);

    let options = SyncOptions {
        backup: false,
        sort_by_name: false,
        ..Default::default()
    };
    install.sync(options).await;

    assert_eq!(
        install.read_entries("loadorder.txt")[5..],
        ["LowOnly.esp", "shared.ESP"]
    );
    assert_eq!(install.read_entries("modlist.txt")[..2], ["+High", "+Low"]);
}

#[tokio::test]
async fn test_unreferenced_mods_are_disabled() {
    let install = Installation::new();
    install.add_mod("Known", &["Known.esp"]);
    install.add_mod("Fresh", &["Fresh.esp"]);
    install.write_profile_file("modlist.txt", &["+Known", "+Removed"]);

    let report = install.sync(no_backup()).await;

    let modlist = install.read_entries("modlist.txt");
    assert!(modlist.contains(&"-Fresh".to_string()));
    assert!(modlist.contains(&"+Known".to_string()));
    assert!(!modlist.iter().any(|line| line.contains("Removed")));
    assert!(report.warnings.contains(&ProfileWarning::StaleReference {
        file: ProfileFile::Modlist,
        entry: "Removed".to_string(),
    }));
}

#[tokio::test]
async fn test_enabled_plugins_round_trip_and_demotion() {
    let install = Installation::new();
    install.add_mod("Keep", &["Keep.esp", "KeepOff.esp"]);
    install.add_mod("Dropped", &["Dropped.esp"]);
    install.write_profile_file("modlist.txt", &["-Dropped", "+Keep"]);
    install.write_profile_file("plugins.txt", &["*Keep.esp", "KeepOff.esp", "*Dropped.esp"]);

    let report = install.sync(no_backup()).await;

    assert_eq!(
        install.read_entries("plugins.txt"),
        vec!["*Keep.esp", "KeepOff.esp"]
    );
    // Dropped.esp is still installed, only its mod is disabled
    assert!(!report.warnings.contains(&ProfileWarning::StaleReference {
        file: ProfileFile::Plugins,
        entry: "dropped.esp".to_string(),
    }));

    // Re-enabling the mod lists its plugin again, demoted
    install.write_profile_file("modlist.txt", &["+Dropped", "+Keep"]);
    install.sync(no_backup()).await;
    assert_eq!(
        install.read_entries("plugins.txt"),
        vec!["Dropped.esp", "*Keep.esp", "KeepOff.esp"]
    );
}

#[tokio::test]
async fn test_loadorder_pins_vanilla_masters() {
    let install = Installation::new();
    install.add_mod("Fixes", &["Update.esm", "Fixes.esp"]);
    install.write_profile_file("modlist.txt", &["+Fixes"]);

    install.sync(no_backup()).await;

    assert_eq!(
        install.read_entries("loadorder.txt"),
        vec![
            "Skyrim.esm",
            "Update.esm",
            "Dawnguard.esm",
            "HearthFires.esm",
            "Dragonborn.esm",
            "Fixes.esp",
        ]
    );
    assert_eq!(install.read_entries("plugins.txt"), vec!["Fixes.esp"]);
}

#[tokio::test]
async fn test_second_run_is_byte_identical() {
    let install = Installation::new();
    install.add_mod("Beta", &["Beta.esp", "Beta - Patch.esp"]);
    install.add_mod("alpha", &["Alpha.esm"]);
    install.add_mod("Gamma", &["Gamma.esl"]);
    install.write_profile_file("modlist.txt", &["+Gamma", "-Beta", "+alpha"]);
    install.write_profile_file("plugins.txt", &["*Alpha.esm", "*Gamma.esl"]);

    install.sync(SyncOptions::default()).await;
    let read_all = || {
        ["modlist.txt", "plugins.txt", "loadorder.txt"]
            .map(|name| fs::read(install.profile().join(name)).unwrap())
    };
    let first = read_all();

    install.sync(no_backup()).await;
    let second = read_all();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_written_files_use_crlf() {
    let install = Installation::new();
    install.add_mod("ModA", &["A.esp"]);

    install.sync(no_backup()).await;

    let raw = fs::read_to_string(install.profile().join("modlist.txt")).unwrap();
    assert!(raw.ends_with("\r\n"));
    assert!(!raw.replace("\r\n", "").contains('\n'));
}

#[tokio::test]
async fn test_sync_by_config_all_profiles() {
    let install = Installation::new();
    install.add_mod("ModA", &["A.esp"]);
    fs::create_dir_all(install.root.join("profiles/Second")).unwrap();

    let config = SyncConfig {
        installation: install.root.clone(),
        scope: SyncScope::AllProfiles,
        backup: false,
        ..Default::default()
    };
    let report = sync_by_config(&config).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.profiles.len(), 2);
    assert!(install.root.join("profiles/Second/plugins.txt").exists());
}

#[tokio::test]
async fn test_sync_by_config_selected_profile_only() {
    let install = Installation::new();
    install.add_mod("ModA", &["A.esp"]);
    fs::create_dir_all(install.root.join("profiles/Other")).unwrap();

    let config = SyncConfig {
        installation: install.root.join("ModOrganizer.ini"),
        ..Default::default()
    };
    let report = sync_by_config(&config).await.unwrap();

    assert_eq!(report.profiles.len(), 1);
    assert_eq!(report.profiles[0].name, "Default");
    assert!(!install.root.join("profiles/Other/modlist.txt").exists());
}

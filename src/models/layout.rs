use serde::{Deserialize, Serialize};

/// First line of every profile file written by Mod Organizer 2
pub const DEFAULT_FILE_HEADER: &str = "# This file was automatically generated by Mod Organizer.";

/// Fixed, non-reorderable content of the base game plus the profile file
/// conventions that go with it.
///
/// A layout is built once (from defaults or `mo2sync.yaml`) and shared
/// read-only by every profile run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameLayout {
    /// Header written as line 1 of each profile file (and skipped on read)
    pub file_header: String,

    pub modlist_file: String,
    pub plugins_file: String,
    pub loadorder_file: String,

    /// Base masters in load order. Always written right after the
    /// loadorder header.
    pub vanilla_masters: Vec<String>,

    /// Base packages in declared order. Written `*`-prefixed, reversed,
    /// at the end of modlist.
    pub base_packages: Vec<String>,

    /// Extension (with leading dot) of full masters
    pub master_extension: String,
    /// Extension (with leading dot) of regular plugins
    pub plugin_extension: String,
    /// Extension (with leading dot) of light masters
    pub light_extension: String,
}

impl GameLayout {
    /// Skyrim Special Edition as managed by Mod Organizer 2.
    pub fn skyrim_special_edition() -> Self {
        Self {
            file_header: DEFAULT_FILE_HEADER.to_string(),
            modlist_file: "modlist.txt".to_string(),
            plugins_file: "plugins.txt".to_string(),
            loadorder_file: "loadorder.txt".to_string(),
            vanilla_masters: vec![
                "Skyrim.esm".to_string(),
                "Update.esm".to_string(),
                "Dawnguard.esm".to_string(),
                "HearthFires.esm".to_string(),
                "Dragonborn.esm".to_string(),
            ],
            base_packages: vec![
                "DLC: Dawnguard".to_string(),
                "DLC: HearthFires".to_string(),
                "DLC: Dragonborn".to_string(),
            ],
            master_extension: ".esm".to_string(),
            plugin_extension: ".esp".to_string(),
            light_extension: ".esl".to_string(),
        }
    }

    /// The three recognized load unit extensions
    pub fn load_unit_extensions(&self) -> [&str; 3] {
        [
            self.master_extension.as_str(),
            self.plugin_extension.as_str(),
            self.light_extension.as_str(),
        ]
    }

    /// Check a file name against the recognized extensions, ignoring case
    pub fn is_load_unit_name(&self, file_name: &str) -> bool {
        self.load_unit_extensions()
            .iter()
            .any(|ext| has_extension(file_name, ext))
    }

    pub fn is_vanilla_master(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.vanilla_masters
            .iter()
            .any(|master| master.to_lowercase() == name)
    }

    pub fn is_base_package(&self, name: &str) -> bool {
        self.base_packages.iter().any(|package| package == name)
    }

    /// Base package lines exactly as they end the modlist file
    pub fn base_package_lines(&self) -> Vec<String> {
        self.base_packages
            .iter()
            .rev()
            .map(|package| format!("*{package}"))
            .collect()
    }
}

impl Default for GameLayout {
    fn default() -> Self {
        Self::skyrim_special_edition()
    }
}

/// Case-insensitive suffix match; `ext` includes the leading dot.
pub fn has_extension(file_name: &str, ext: &str) -> bool {
    let name_len = file_name.len();
    let ext_len = ext.len();
    name_len > ext_len
        && file_name.is_char_boundary(name_len - ext_len)
        && file_name[name_len - ext_len..].eq_ignore_ascii_case(ext)
}

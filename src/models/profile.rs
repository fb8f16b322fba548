use crate::models::GameLayout;
use crate::services::package_index::compare_names;
use camino::Utf8PathBuf;
use indexmap::IndexSet;
use std::fmt;

/// The three state files of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileFile {
    Modlist,
    Plugins,
    Loadorder,
}

impl ProfileFile {
    /// File name of this profile file under the given layout
    pub fn file_name(self, layout: &GameLayout) -> &str {
        match self {
            Self::Modlist => &layout.modlist_file,
            Self::Plugins => &layout.plugins_file,
            Self::Loadorder => &layout.loadorder_file,
        }
    }
}

impl fmt::Display for ProfileFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Modlist => "modlist",
            Self::Plugins => "plugins",
            Self::Loadorder => "loadorder",
        };
        f.write_str(name)
    }
}

/// How the game treats a load unit, from its extension and record flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadUnitKind {
    Master,
    Plugin,
    LightMaster,
    LightPlugin,
    Other,
}

/// An installed mod directory with its state in one profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPackage {
    pub name: String,
    pub enabled: bool,
    /// Position in the priority-ascending order. Larger loads later and
    /// wins conflicts.
    pub priority: usize,
}

/// A resolved load unit, attributed to the package that provides it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadUnit {
    pub name: String,
    pub package: String,
    /// `None` when the file could not be read for classification
    pub kind: Option<LoadUnitKind>,
}

/// Recovered, non-fatal problems found while reading a profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileWarning {
    /// The file does not exist. Its enabled set is empty and it is not
    /// backed up on write.
    MissingProfileFile(ProfileFile),

    /// An entry names a package or load unit that is no longer installed
    StaleReference { file: ProfileFile, entry: String },

    /// A load unit exists but could not be classified
    UnclassifiedUnit { name: String, reason: String },
}

impl fmt::Display for ProfileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingProfileFile(file) => write!(f, "{file} file not found"),
            Self::StaleReference { file, entry } => {
                write!(f, "{file} entry '{entry}' is not installed, dropped")
            }
            Self::UnclassifiedUnit { name, reason } => {
                write!(f, "could not classify '{name}': {reason}")
            }
        }
    }
}

/// Normalized state of one profile, rebuilt from disk on every run
#[derive(Debug, Clone, Default)]
pub struct ProfileState {
    pub profile_dir: Utf8PathBuf,

    /// Every installed package, priority ascending
    pub packages: Vec<ContentPackage>,

    /// Enabled load unit names from plugins, lowercased
    pub enabled_units: IndexSet<String>,

    pub has_modlist_file: bool,
    pub has_plugins_file: bool,
    pub has_loadorder_file: bool,

    pub warnings: Vec<ProfileWarning>,
}

impl ProfileState {
    /// Enabled packages, priority ascending
    pub fn enabled_packages(&self) -> Vec<String> {
        self.packages
            .iter()
            .filter(|package| package.enabled)
            .map(|package| package.name.clone())
            .collect()
    }

    pub fn is_unit_enabled(&self, name: &str) -> bool {
        self.enabled_units.contains(&name.to_lowercase())
    }

    /// Whether the file existed when the profile was read
    pub fn has_file(&self, file: ProfileFile) -> bool {
        match file {
            ProfileFile::Modlist => self.has_modlist_file,
            ProfileFile::Plugins => self.has_plugins_file,
            ProfileFile::Loadorder => self.has_loadorder_file,
        }
    }

    pub fn file_path(&self, file: ProfileFile, layout: &GameLayout) -> Utf8PathBuf {
        self.profile_dir.join(file.file_name(layout))
    }

    /// Reorder packages by name, keeping enable state
    pub fn sort_packages_by_name(&mut self) {
        self.packages.sort_by(|a, b| compare_names(&a.name, &b.name));
        for (priority, package) in self.packages.iter_mut().enumerate() {
            package.priority = priority;
        }
    }
}

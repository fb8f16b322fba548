//! mo2sync - Mod Organizer 2 profile synchronization
//!
//! Main entry point for the command line tool.
//!
//! # Overview
//!
//! Rebuilds `modlist.txt`, `plugins.txt` and `loadorder.txt` of Mod Organizer 2
//! profiles from the mods that are actually installed. The binary:
//! - Parses command line flags (clap)
//! - Loads `mo2sync.yaml` ([`ConfigManager`]) and applies flag overrides
//! - Initializes logging (file rotation + console output)
//! - Runs the synchronization on a tokio runtime
//! - Prints one summary line per profile
//!
//! # Execution Flow
//!
//! 1. Parse flags and load the YAML configuration
//! 2. Initialize logging → `<log-dir>/mo2sync.<date>`
//! 3. Create the tokio runtime
//! 4. Read `ModOrganizer.ini` and index the installed mods
//! 5. Synchronize the selected profile, or every profile with `--all-profiles`
//!
//! # Exit status
//!
//! Non-zero when the installation cannot be opened or any profile failed.

use anyhow::{Result, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use mo2sync::{APP_NAME, ConfigManager, SyncConfig, SyncScope, VERSION, logging, sync_by_config};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "mo2sync",
    about = "Synchronize Mod Organizer 2 profiles with the installed mods",
    version,
    long_about = "Regenerates modlist.txt, plugins.txt and loadorder.txt of Mod Organizer 2 profiles so they list exactly the mods and plugins that are installed, keeping existing enable state."
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "MO2SYNC_CONFIG", default_value = "mo2sync.yaml")]
    config: Utf8PathBuf,

    /// ModOrganizer.ini, or the Mod Organizer 2 directory containing it
    #[arg(short, long, env = "MO2SYNC_INSTALLATION")]
    installation: Option<Utf8PathBuf>,

    /// Synchronize every profile instead of the selected one
    #[arg(long)]
    all_profiles: bool,

    /// Overwrite profile files without keeping a backup
    #[arg(long)]
    no_backup: bool,

    /// Keep the modlist priority order instead of sorting mods by name
    #[arg(long)]
    no_sort_by_name: bool,

    /// Only rewrite modlist.txt
    #[arg(long)]
    mods_only: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: Utf8PathBuf,
}

impl Cli {
    /// Apply flag overrides on top of the loaded configuration
    fn apply(&self, config: &mut SyncConfig) {
        if let Some(installation) = &self.installation {
            config.installation = installation.clone();
        }
        if self.all_profiles {
            config.scope = SyncScope::AllProfiles;
        }
        if self.no_backup {
            config.backup = false;
        }
        if self.no_sort_by_name {
            config.sort_by_name = false;
        }
        if self.mods_only {
            config.sync_plugins = false;
        }
        if self.debug {
            config.debug_mode = true;
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config_manager = ConfigManager::for_file(&cli.config)?;
    let mut config = config_manager.load_sync_config()?;
    cli.apply(&mut config);

    let _guard = logging::setup_logging_with_console(
        &cli.log_dir,
        logging::LOG_PREFIX,
        config.debug_mode,
        true,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    if config.installation.as_str().is_empty() {
        bail!(
            "No Mod Organizer installation configured; pass --installation or set `installation` in {}",
            config_manager.config_path()
        );
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("mo2sync-worker")
        .build()?;

    let report = runtime.block_on(sync_by_config(&config))?;

    for profile in &report.profiles {
        println!("{}", profile.summary());
        for warning in &profile.warnings {
            println!("  warning: {}", warning);
        }
    }
    for failure in &report.failures {
        println!("{}: failed: {}", failure.name, failure.message);
    }

    tracing::info!("Synchronization complete");
    Ok(report.is_success())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

//! Configuration management CLI commands.
//!
//! Provides `config init`, `config path`, and `config show` for creating
//! and inspecting `~/.groundtrack/config.ini`.

use clap::Subcommand;
use groundtrack::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Create the configuration file with default values
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path
    Path,

    /// Show the effective configuration
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { force } => run_init(force),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
    }
}

/// Write a default configuration file.
fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path();

    if force {
        ConfigFile::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    if path.exists() {
        println!("Configuration already exists at {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    let path = ConfigFile::ensure_exists()?;
    println!("Created {}", path.display());
    Ok(())
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

/// Show effective settings, falling back to defaults for a missing file.
fn run_show() -> Result<(), CliError> {
    let path = config_file_path();
    let config = ConfigFile::load()?;

    println!("Configuration Settings");
    println!("======================");
    if path.exists() {
        println!("Source: {}", path.display());
    } else {
        println!("Source: built-in defaults ({} not found)", path.display());
    }
    println!();

    println!("[tracker]");
    println!(
        "  interpolation_period_ms = {}",
        config.tracker.interpolation_period_ms
    );
    println!(
        "  event_channel_capacity = {}",
        config.tracker.event_channel_capacity
    );
    println!(
        "  status_log_interval_secs = {}",
        config.tracker.status_log_interval_secs
    );
    println!();

    println!("[logging]");
    println!("  file = {}", config.logging.file.display());

    Ok(())
}

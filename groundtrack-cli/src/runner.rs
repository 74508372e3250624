//! CLI runner for common setup.
//!
//! Encapsulates config loading and logging initialization so command
//! handlers start from the same state.

use crate::error::CliError;
use groundtrack::config::ConfigFile;
use groundtrack::logging::{init_logging_full, LoggingGuard};
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    /// * `log_to_stdout` - Mirror log output to stdout
    pub fn new(debug_mode: bool, log_to_stdout: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "groundtrack.log".to_string());

        let logging_guard = init_logging_full(&log_dir, &log_file, log_to_stdout, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("groundtrack v{}", groundtrack::VERSION);
        info!(
            log_file = %self.config.logging.file.display(),
            "groundtrack CLI: {} command",
            command
        );
    }
}

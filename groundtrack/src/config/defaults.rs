//! Default values and constants for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;

// =============================================================================
// [tracker]
// =============================================================================

/// Interpolation ticker period in milliseconds.
pub const DEFAULT_INTERPOLATION_PERIOD_MS: u64 = 33;

/// Shortest accepted ticker period.
pub const MIN_INTERPOLATION_PERIOD_MS: u64 = 1;

/// Tracker event broadcast channel capacity.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 64;

/// Status logger interval in seconds (0 disables the logger).
pub const DEFAULT_STATUS_LOG_INTERVAL_SECS: u64 = 5;

// =============================================================================
// [logging]
// =============================================================================

/// Default log file name.
pub const DEFAULT_LOG_FILE_NAME: &str = "groundtrack.log";

/// Default log file path (~/.groundtrack/groundtrack.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join(DEFAULT_LOG_FILE_NAME)
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            interpolation_period_ms: DEFAULT_INTERPOLATION_PERIOD_MS,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            status_log_interval_secs: DEFAULT_STATUS_LOG_INTERVAL_SECS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            tracker: TrackerSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

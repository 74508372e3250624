//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::position::TrackerConfig;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Tracker settings
    pub tracker: TrackerSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Position tracker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerSettings {
    /// Interpolation ticker period in milliseconds
    pub interpolation_period_ms: u64,
    /// Tracker event broadcast channel capacity
    pub event_channel_capacity: usize,
    /// Status logger interval in seconds (0 = disabled)
    pub status_log_interval_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl ConfigFile {
    /// Runtime tracker configuration derived from `[tracker]`.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            interpolation_period: Duration::from_millis(self.tracker.interpolation_period_ms),
        }
    }

    /// Status logger interval, or `None` when disabled.
    pub fn status_log_interval(&self) -> Option<Duration> {
        match self.tracker.status_log_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

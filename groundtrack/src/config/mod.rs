//! Configuration for groundtrack components.
//!
//! User settings live in `~/.groundtrack/config.ini`:
//!
//! ```ini
//! [tracker]
//! interpolation_period_ms = 33
//! event_channel_capacity = 64
//! status_log_interval_secs = 5
//!
//! [logging]
//! file = ~/.groundtrack/groundtrack.log
//! ```
//!
//! # Example
//!
//! ```
//! use groundtrack::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! let tracker_config = config.tracker_config();
//! assert_eq!(tracker_config.interpolation_period.as_millis(), 33);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, LoggingSettings, TrackerSettings};

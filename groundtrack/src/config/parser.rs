//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::defaults::MIN_INTERPOLATION_PERIOD_MS;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [tracker] section
    if let Some(section) = ini.section(Some("tracker")) {
        if let Some(v) = section.get("interpolation_period_ms") {
            let period: u64 = v.trim().parse().map_err(|_| {
                invalid(
                    "tracker",
                    "interpolation_period_ms",
                    v,
                    "must be a positive integer (milliseconds)",
                )
            })?;
            if period < MIN_INTERPOLATION_PERIOD_MS {
                return Err(invalid(
                    "tracker",
                    "interpolation_period_ms",
                    v,
                    "must be at least 1",
                ));
            }
            config.tracker.interpolation_period_ms = period;
        }
        if let Some(v) = section.get("event_channel_capacity") {
            let capacity: usize = v.trim().parse().map_err(|_| {
                invalid(
                    "tracker",
                    "event_channel_capacity",
                    v,
                    "must be a positive integer",
                )
            })?;
            if capacity == 0 {
                return Err(invalid(
                    "tracker",
                    "event_channel_capacity",
                    v,
                    "must be at least 1",
                ));
            }
            config.tracker.event_channel_capacity = capacity;
        }
        if let Some(v) = section.get("status_log_interval_secs") {
            config.tracker.status_log_interval_secs = v.trim().parse().map_err(|_| {
                invalid(
                    "tracker",
                    "status_log_interval_secs",
                    v,
                    "must be a non-negative integer (seconds, 0 = disabled)",
                )
            })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_tracker_section() {
        let config = parse(
            "[tracker]\ninterpolation_period_ms = 20\nevent_channel_capacity = 256\nstatus_log_interval_secs = 0\n",
        )
        .unwrap();

        assert_eq!(config.tracker.interpolation_period_ms, 20);
        assert_eq!(config.tracker.event_channel_capacity, 256);
        assert_eq!(config.tracker.status_log_interval_secs, 0);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config = parse("[tracker]\nevent_channel_capacity = 8\n").unwrap();

        assert_eq!(
            config.tracker.interpolation_period_ms,
            DEFAULT_INTERPOLATION_PERIOD_MS
        );
        assert_eq!(config.tracker.event_channel_capacity, 8);
    }

    #[test]
    fn test_invalid_period_reports_key() {
        let err = parse("[tracker]\ninterpolation_period_ms = fast\n").unwrap_err();

        match err {
            ConfigFileError::InvalidValue {
                section,
                key,
                value,
                ..
            } => {
                assert_eq!(section, "tracker");
                assert_eq!(key, "interpolation_period_ms");
                assert_eq!(value, "fast");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(parse("[tracker]\ninterpolation_period_ms = 0\n").is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(parse("[tracker]\nevent_channel_capacity = 0\n").is_err());
    }

    #[test]
    fn test_logging_file_expands_tilde() {
        let config = parse("[logging]\nfile = ~/logs/track.log\n").unwrap();

        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.logging.file, home.join("logs/track.log"));
        }
    }

    #[test]
    fn test_empty_logging_file_keeps_default() {
        let config = parse("[logging]\nfile =\n").unwrap();
        assert_eq!(config.logging.file, default_log_file());
    }
}

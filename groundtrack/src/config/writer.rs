//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[tracker]
; Interval at which the dead-reckoned position is invalidated, in milliseconds
interpolation_period_ms = {}
; Capacity of the tracker event broadcast channel
event_channel_capacity = {}
; Interval of the DEBUG status log, in seconds (0 = disabled)
status_log_interval_secs = {}

[logging]
; Log file location
file = {}
"#,
        config.tracker.interpolation_period_ms,
        config.tracker.event_channel_capacity,
        config.tracker.status_log_interval_secs,
        path_to_string(&config.logging.file),
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_config_contains_sections() {
        let content = to_config_string(&ConfigFile::default());

        assert!(content.contains("[tracker]"));
        assert!(content.contains("interpolation_period_ms = 33"));
        assert!(content.contains("[logging]"));
    }
}

//! Reading and writing `~/.groundtrack/config.ini`.
//!
//! A missing file is not an error: the tracker runs on built-in defaults
//! until `groundtrack config init` writes one.

use ini::Ini;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::parser::parse_ini;
use super::settings::ConfigFile;
use super::writer::to_config_string;

/// Name of the per-user directory under `$HOME`.
const CONFIG_DIR_NAME: &str = ".groundtrack";

/// Name of the INI file inside [`config_directory`].
const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors raised while loading or saving the config file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file exists but is not valid INI
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// The serialized config could not be written
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// A key parsed but its value is out of range or malformed
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// The parent directory of the config file could not be created
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Read [`config_file_path`], or return defaults when it is absent.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Read `path`, or return defaults when it is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        match path.try_exists() {
            Ok(true) => parse_ini(&Ini::load_from_file(path)?),
            _ => Ok(Self::default()),
        }
    }

    /// Write to [`config_file_path`].
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Write to `path`, creating missing parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(ConfigFileError::DirectoryError)?;
        }

        fs::write(path, to_config_string(self))
            .map_err(|e| ConfigFileError::WriteError(format!("{}: {}", path.display(), e)))
    }

    /// Write a default file unless one is already present.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }
}

/// `~/.groundtrack`, or `./.groundtrack` when no home directory is known.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// `~/.groundtrack/config.ini`.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

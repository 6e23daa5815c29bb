//! Application configuration management.
//!
//! Defaults for the scan tuning knobs live in a small JSON file in the
//! platform config directory. Command-line flags override anything set here.

use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while reading the config file.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// No home directory could be determined for this user.
    #[error("Failed to determine project directories")]
    NoProjectDirs,

    /// The file exists but could not be read.
    #[error("Config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for [`Config`].
    #[error("Malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker threads for fingerprinting.
    pub io_threads: Option<usize>,
    /// Read buffer size in bytes.
    pub chunk_size: Option<usize>,
    /// Whether ZIP and RAR containers are opened.
    pub scan_archives: Option<bool>,
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    ///
    /// A missing file yields defaults silently; any other failure is logged
    /// and defaults are used.
    #[must_use]
    pub fn load() -> Self {
        let result = Self::config_path().and_then(|path| Self::load_from(&path));
        match result {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring config: {e}");
                Self::default()
            }
        }
    }

    /// Load the configuration from `path`. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the default platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoProjectDirs`] when no home directory is known.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let project_dirs =
            ProjectDirs::from("com", "arcdupe", "arcdupe").ok_or(ConfigError::NoProjectDirs)?;
        Ok(project_dirs.config_dir().join("config.json"))
    }
}

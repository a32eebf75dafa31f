//! Infrastructure configuration - fixed for the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem locations for the sound library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the library database.
    /// Default: ~/.local/share/soundshelf
    #[serde(default = "PathsConfig::default_state_dir")]
    pub state_dir: PathBuf,

    /// Database file name inside `state_dir`.
    /// Default: soundshelf.db
    #[serde(default = "PathsConfig::default_database_file")]
    pub database_file: String,
}

impl PathsConfig {
    pub(crate) fn default_state_dir() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".local/share/soundshelf"))
            .unwrap_or_else(|| PathBuf::from(".local/share/soundshelf"))
    }

    pub(crate) fn default_database_file() -> String {
        "soundshelf.db".to_string()
    }

    /// Full path of the library database.
    pub fn database_path(&self) -> PathBuf {
        self.state_dir.join(&self.database_file)
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_dir: Self::default_state_dir(),
            database_file: Self::default_database_file(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    pub(crate) fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

/// Infrastructure configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

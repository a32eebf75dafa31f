//! Configuration loading for soundshelf.
//!
//! Configuration is split into two categories:
//!
//! - **Infrastructure** (`InfraConfig`): where the library database lives and
//!   how verbose logging is. Fixed for the lifetime of the process.
//!
//! - **Bootstrap** (`BootstrapConfig`): the playlist limit and the sounds a
//!   fresh library is seeded with. After the first open the database is the
//!   source of truth for library contents.
//!
//! # Usage
//!
//! ```rust,no_run
//! use shelfconf::ShelfConfig;
//!
//! let config = ShelfConfig::load().expect("Failed to load config");
//! println!("database: {}", config.infra.paths.database_path().display());
//! println!("playlist limit: {}", config.bootstrap.limits.max_playlists);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/soundshelf/config.toml` (system)
//! 2. `~/.config/soundshelf/config.toml` (user)
//! 3. `./soundshelf.toml` (local override)
//! 4. Environment variables (`SOUNDSHELF_*`, `RUST_LOG`)

pub mod bootstrap;
pub mod infra;
pub mod loader;

pub use bootstrap::{BootstrapConfig, LimitsConfig, SeedConfig, SeedPlaylist, SeedSound};
pub use infra::{InfraConfig, PathsConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete soundshelf configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfConfig {
    #[serde(flatten)]
    pub infra: InfraConfig,

    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl ShelfConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` replacing the local
    /// `./soundshelf.toml` override. System and user configs still load first.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and env vars contributed.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = ShelfConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            config = loader::load_onto(&path, config)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# soundshelf configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!(
            "state_dir = {}\n",
            toml_string(&self.infra.paths.state_dir.to_string_lossy())
        ));
        output.push_str(&format!(
            "database_file = {}\n",
            toml_string(&self.infra.paths.database_file)
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "log_level = {}\n",
            toml_string(&self.infra.telemetry.log_level)
        ));

        output.push_str("\n[bootstrap.limits]\n");
        output.push_str(&format!(
            "max_playlists = {}\n",
            self.bootstrap.limits.max_playlists
        ));

        for sound in &self.bootstrap.seed.sounds {
            output.push_str("\n[[bootstrap.seed.sounds]]\n");
            output.push_str(&format!("id = {}\n", toml_string(&sound.id)));
            output.push_str(&format!("name = {}\n", toml_string(&sound.name)));
            output.push_str(&format!("file_path = {}\n", toml_string(&sound.file_path)));
        }

        if let Some(playlist) = &self.bootstrap.seed.playlist {
            output.push_str("\n[bootstrap.seed.playlist]\n");
            output.push_str(&format!("name = {}\n", toml_string(&playlist.name)));
            let ids: Vec<String> = playlist.sound_ids.iter().map(|id| toml_string(id)).collect();
            output.push_str(&format!("sound_ids = [{}]\n", ids.join(", ")));
        }

        output
    }
}

/// Render `value` as a TOML string literal, escaped as needed.
fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

//! Config file discovery, loading, and environment variable overlay.

use crate::bootstrap::SeedConfig;
use crate::{ConfigError, ShelfConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with an explicit override path.
///
/// If `override_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(override_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/soundshelf/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("soundshelf/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = override_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("soundshelf.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<ShelfConfig, ConfigError> {
    load_onto(path, ShelfConfig::default())
}

/// Layer a TOML file over `base`. Only keys present in the file change.
pub fn load_onto(path: &Path, base: ShelfConfig) -> Result<ShelfConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(base, &contents, path)
}

/// Parse config from a TOML string.
pub(crate) fn parse_toml(contents: &str, path: &Path) -> Result<ShelfConfig, ConfigError> {
    apply_toml(ShelfConfig::default(), contents, path)
}

/// Overwrite the values of `config` that `contents` sets explicitly.
pub(crate) fn apply_toml(
    mut config: ShelfConfig,
    contents: &str,
    path: &Path,
) -> Result<ShelfConfig, ConfigError> {
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| parse_err(e.to_string()))?;

    if let Some(paths) = table.get("paths").and_then(|v| v.as_table()) {
        if let Some(v) = paths.get("state_dir").and_then(|v| v.as_str()) {
            config.infra.paths.state_dir = expand_path(v);
        }
        if let Some(v) = paths.get("database_file").and_then(|v| v.as_str()) {
            config.infra.paths.database_file = v.to_string();
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.infra.telemetry.log_level = v.to_string();
        }
    }

    if let Some(section) = table.get("bootstrap").and_then(|v| v.as_table()) {
        if let Some(limits) = section.get("limits").and_then(|v| v.as_table()) {
            if let Some(v) = limits.get("max_playlists").and_then(|v| v.as_integer()) {
                if v < 0 {
                    return Err(parse_err(format!("max_playlists must not be negative, got {}", v)));
                }
                config.bootstrap.limits.max_playlists = v as usize;
            }
        }

        if let Some(seed) = section.get("seed") {
            config.bootstrap.seed = seed
                .clone()
                .try_into::<SeedConfig>()
                .map_err(|e| parse_err(format!("invalid [bootstrap.seed]: {}", e)))?;
        }
    }

    Ok(config)
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut ShelfConfig, sources: &mut ConfigSources) {
    if let Ok(v) = env::var("SOUNDSHELF_STATE_DIR") {
        config.infra.paths.state_dir = expand_path(&v);
        sources.env_overrides.push("SOUNDSHELF_STATE_DIR".to_string());
    }
    if let Ok(v) = env::var("SOUNDSHELF_DATABASE_FILE") {
        config.infra.paths.database_file = v;
        sources.env_overrides.push("SOUNDSHELF_DATABASE_FILE".to_string());
    }

    if let Ok(v) = env::var("SOUNDSHELF_LOG_LEVEL") {
        config.infra.telemetry.log_level = v;
        sources.env_overrides.push("SOUNDSHELF_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Ok(v) = env::var("RUST_LOG") {
        config.infra.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    if let Ok(v) = env::var("SOUNDSHELF_MAX_PLAYLISTS") {
        if let Ok(limit) = v.parse() {
            config.bootstrap.limits.max_playlists = limit;
            sources.env_overrides.push("SOUNDSHELF_MAX_PLAYLISTS".to_string());
        }
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}

//! Bootstrap configuration - seeds the library, then the database owns it.

use serde::{Deserialize, Serialize};

/// Limits applied by the library before it touches storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum number of playlists a user may create.
    #[serde(default = "LimitsConfig::default_max_playlists")]
    pub max_playlists: usize,
}

impl LimitsConfig {
    pub(crate) fn default_max_playlists() -> usize {
        5
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_playlists: Self::default_max_playlists(),
        }
    }
}

/// A sound inserted when the library is created empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSound {
    pub id: String,
    pub name: String,
    pub file_path: String,
}

/// A starter playlist inserted alongside the seed sounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPlaylist {
    pub name: String,
    #[serde(default)]
    pub sound_ids: Vec<String>,
}

/// Initial library contents.
///
/// A `[bootstrap.seed]` section replaces the compiled seed wholesale, so
/// fields it leaves out are empty rather than defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub sounds: Vec<SeedSound>,

    #[serde(default)]
    pub playlist: Option<SeedPlaylist>,
}

impl SeedConfig {
    pub(crate) fn default_sounds() -> Vec<SeedSound> {
        vec![
            SeedSound {
                id: "rain_strong_1".to_string(),
                name: "Strong Rain".to_string(),
                file_path: "res://raw/strong_rain".to_string(),
            },
            SeedSound {
                id: "forest_1".to_string(),
                name: "Forest".to_string(),
                file_path: "res://raw/forest".to_string(),
            },
        ]
    }

    pub(crate) fn default_playlist() -> Option<SeedPlaylist> {
        Some(SeedPlaylist {
            name: "My First Mix".to_string(),
            sound_ids: vec!["rain_strong_1".to_string()],
        })
    }

    /// A seed that inserts nothing.
    pub fn empty() -> Self {
        Self {
            sounds: Vec::new(),
            playlist: None,
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            sounds: Self::default_sounds(),
            playlist: Self::default_playlist(),
        }
    }
}

/// Bootstrap configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub seed: SeedConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_defaults() {
        assert_eq!(LimitsConfig::default().max_playlists, 5);
    }

    #[test]
    fn test_seed_defaults() {
        let seed = SeedConfig::default();
        assert_eq!(seed.sounds.len(), 2);
        assert_eq!(seed.sounds[0].id, "rain_strong_1");
        assert_eq!(seed.sounds[1].name, "Forest");

        let playlist = seed.playlist.unwrap();
        assert_eq!(playlist.name, "My First Mix");
        assert_eq!(playlist.sound_ids, vec!["rain_strong_1".to_string()]);
    }

    #[test]
    fn test_empty_seed() {
        let seed = SeedConfig::empty();
        assert!(seed.sounds.is_empty());
        assert!(seed.playlist.is_none());
    }
}

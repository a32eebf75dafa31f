use serde::{Deserialize, Serialize};

/// Stable identifier of a sound, e.g. `rain_strong_1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundId(pub String);

impl SoundId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SoundId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row id of a playlist, assigned by the database on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(pub i64);

impl std::fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named audio asset reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sound {
    pub id: SoundId,
    pub name: String,
    /// Locator of the audio file; never interpreted here.
    pub file_path: String,
    pub is_favorite: bool,
}

impl Sound {
    pub fn new(id: impl Into<String>, name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            id: SoundId(id.into()),
            name: name.into(),
            file_path: file_path.into(),
            is_favorite: false,
        }
    }
}

/// A named, ordered collection of sound references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    /// Member sounds in insertion order. Ids may dangle.
    pub sound_ids: Vec<SoundId>,
    pub is_favorite: bool,
}

/// Encode a sound id list for the `playlists.sound_ids` column.
pub fn encode_sound_ids(ids: &[SoundId]) -> Result<String, serde_json::Error> {
    serde_json::to_string(ids)
}

/// Decode the `playlists.sound_ids` column.
pub fn decode_sound_ids(json: &str) -> Result<Vec<SoundId>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Names must contain something other than whitespace.
pub fn is_blank(name: &str) -> bool {
    name.trim().is_empty()
}

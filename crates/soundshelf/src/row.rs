use serde::Serialize;
use shelfdb::{PlaylistId, Sound};

/// One entry of a flattened playlist list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayRow {
    Header {
        playlist_id: PlaylistId,
        playlist_name: String,
        is_expanded: bool,
        is_favorite: bool,
    },
    Sound {
        sound: Sound,
        parent_playlist_id: PlaylistId,
    },
}

impl DisplayRow {
    /// Identity key, stable across recomputation.
    ///
    /// The same sound inside two playlists yields two distinct keys.
    pub fn key(&self) -> String {
        match self {
            DisplayRow::Header { playlist_id, .. } => format!("header_{}", playlist_id),
            DisplayRow::Sound {
                sound,
                parent_playlist_id,
            } => format!("sound_{}_{}", parent_playlist_id, sound.id),
        }
    }

    pub fn playlist_id(&self) -> PlaylistId {
        match self {
            DisplayRow::Header { playlist_id, .. } => *playlist_id,
            DisplayRow::Sound {
                parent_playlist_id, ..
            } => *parent_playlist_id,
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, DisplayRow::Header { .. })
    }
}

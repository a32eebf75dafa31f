//! Flattening of playlists into display rows.
//!
//! Each playlist contributes a header row. Expanded playlists follow it with
//! one row per resolved member sound, in the playlist's own order. Member ids
//! that resolve to nothing simply produce no row.

use std::collections::HashMap;

use async_trait::async_trait;
use shelfdb::{Playlist, PlaylistId, Sound, SoundId, SoundStore, StoreError};
use tracing::trace;

use crate::row::DisplayRow;

/// Batched sound lookup.
///
/// Implementations return sounds in the order of `ids` and leave out ids
/// they do not know.
#[async_trait]
pub trait SoundResolver: Send + Sync {
    async fn resolve(&self, ids: &[SoundId]) -> Result<Vec<Sound>, StoreError>;
}

#[async_trait]
impl SoundResolver for SoundStore {
    async fn resolve(&self, ids: &[SoundId]) -> Result<Vec<Sound>, StoreError> {
        self.get_by_ids(ids.to_vec()).await
    }
}

#[async_trait]
impl SoundResolver for HashMap<SoundId, Sound> {
    async fn resolve(&self, ids: &[SoundId]) -> Result<Vec<Sound>, StoreError> {
        Ok(ids.iter().filter_map(|id| self.get(id).cloned()).collect())
    }
}

/// Which playlists take part in a materialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterializeMode {
    #[default]
    All,
    FavoritesOnly,
}

impl MaterializeMode {
    pub fn includes(&self, playlist: &Playlist) -> bool {
        match self {
            MaterializeMode::All => true,
            MaterializeMode::FavoritesOnly => playlist.is_favorite,
        }
    }
}

/// Build the display rows for `playlists` in their given order.
///
/// Collapsed playlists are never resolved. Any resolver error fails the
/// whole call; no partial row list is returned.
pub async fn materialize(
    playlists: &[Playlist],
    expansion: &HashMap<PlaylistId, bool>,
    resolver: &dyn SoundResolver,
    mode: MaterializeMode,
) -> Result<Vec<DisplayRow>, StoreError> {
    let mut rows = Vec::with_capacity(playlists.len());

    for playlist in playlists.iter().filter(|p| mode.includes(p)) {
        let is_expanded = expansion.get(&playlist.id).copied().unwrap_or(false);
        rows.push(DisplayRow::Header {
            playlist_id: playlist.id,
            playlist_name: playlist.name.clone(),
            is_expanded,
            is_favorite: playlist.is_favorite,
        });

        if !is_expanded || playlist.sound_ids.is_empty() {
            continue;
        }

        let sounds = resolver.resolve(&playlist.sound_ids).await?;
        trace!(
            playlist.id = %playlist.id,
            requested = playlist.sound_ids.len(),
            resolved = sounds.len(),
            "resolved playlist sounds"
        );
        rows.extend(sounds.into_iter().map(|sound| DisplayRow::Sound {
            sound,
            parent_playlist_id: playlist.id,
        }));
    }

    Ok(rows)
}

use tokio::sync::watch;

use crate::store::{PlaylistStore, Snapshot, SoundStore};
use crate::types::{Playlist, Sound};

/// Read-only view of the two favorite streams.
///
/// Both come straight from the stores' filtered queries, so a favorite flag
/// change shows up here once its write has committed.
#[derive(Clone)]
pub struct FavoritesIndex {
    sounds: SoundStore,
    playlists: PlaylistStore,
}

impl FavoritesIndex {
    pub fn new(sounds: SoundStore, playlists: PlaylistStore) -> Self {
        Self { sounds, playlists }
    }

    pub fn favorite_playlists(&self) -> watch::Receiver<Snapshot<Playlist>> {
        self.playlists.subscribe_favorites()
    }

    pub fn favorite_sounds(&self) -> watch::Receiver<Snapshot<Sound>> {
        self.sounds.subscribe_favorites()
    }
}

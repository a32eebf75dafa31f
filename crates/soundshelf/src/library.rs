//! The library handle: stores, expansion flags and list controllers.

use std::sync::Arc;

use anyhow::Context;
use shelfconf::{LimitsConfig, ShelfConfig};
use shelfdb::{
    seed, Database, FavoritesIndex, Playlist, PlaylistId, PlaylistStore, Snapshot, Sound, SoundId,
    SoundStore, StoreError,
};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::controller::ListController;
use crate::expansion::ExpansionState;
use crate::materializer::{MaterializeMode, SoundResolver};

/// Errors surfaced by [`Library`] operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Creating another playlist would exceed the configured limit.
    #[error("playlist limit reached ({limit})")]
    LimitReached { limit: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = LibraryError> = std::result::Result<T, E>;

/// Handle over one sound library.
///
/// The browse and favorites surfaces each have their own expansion flags.
/// Operations against a playlist that no longer exists are logged and
/// otherwise ignored.
pub struct Library {
    sounds: SoundStore,
    playlists: PlaylistStore,
    browse_expansion: ExpansionState,
    favorites_expansion: ExpansionState,
    limits: LimitsConfig,
    create_gate: Mutex<()>,
}

impl Library {
    /// Open the library at the configured database path, seeding it on first
    /// use.
    pub async fn open(config: &ShelfConfig) -> anyhow::Result<Self> {
        let path = config.infra.paths.database_path();
        let seed_config = config.bootstrap.seed.clone();
        let db_path = path.clone();
        let db = tokio::task::spawn_blocking(move || -> anyhow::Result<Database> {
            let db = Database::open(&db_path).with_context(|| {
                format!("Failed to open library database {}", db_path.display())
            })?;
            seed::populate(&db, &seed_config).context("Failed to seed library")?;
            Ok(db)
        })
        .await
        .context("Library open task failed")??;

        let library = Self::new(Arc::new(db), config.bootstrap.limits.clone())
            .await
            .context("Failed to load library")?;
        info!(
            path = %path.display(),
            sounds = library.sounds.all().len(),
            playlists = library.playlists.all().len(),
            "library opened"
        );
        Ok(library)
    }

    /// Build a library over an already opened database.
    pub async fn new(db: Arc<Database>, limits: LimitsConfig) -> Result<Self> {
        let sounds = SoundStore::open(Arc::clone(&db)).await?;
        let playlists = PlaylistStore::open(db).await?;
        Ok(Self {
            sounds,
            playlists,
            browse_expansion: ExpansionState::new(),
            favorites_expansion: ExpansionState::new(),
            limits,
            create_gate: Mutex::new(()),
        })
    }

    pub fn sounds(&self) -> &SoundStore {
        &self.sounds
    }

    pub fn playlists(&self) -> &PlaylistStore {
        &self.playlists
    }

    pub fn favorites_index(&self) -> FavoritesIndex {
        FavoritesIndex::new(self.sounds.clone(), self.playlists.clone())
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Create an empty playlist named `name` (trimmed).
    pub async fn create_playlist(&self, name: &str) -> Result<Playlist> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("playlist name must not be blank".to_string()).into());
        }

        let _gate = self.create_gate.lock().await;
        let limit = self.limits.max_playlists;
        let count = self.playlists.count().await?;
        if count >= limit {
            warn!(count, limit, "playlist limit reached");
            return Err(LibraryError::LimitReached { limit });
        }

        Ok(self.playlists.insert(name).await?)
    }

    /// Delete a playlist and drop its expansion flags.
    pub async fn delete_playlist(&self, id: PlaylistId) -> Result<bool> {
        let deleted = self.playlists.delete(id).await?;
        if !deleted {
            warn!(playlist.id = %id, "playlist not found for delete");
        }
        self.browse_expansion.forget(id);
        self.favorites_expansion.forget(id);
        Ok(deleted)
    }

    pub async fn rename_playlist(&self, id: PlaylistId, new_name: &str) -> Result<()> {
        let result = self.playlists.rename(id, new_name.trim()).await;
        swallow_not_found(result, "rename")
    }

    pub async fn set_playlist_favorite(&self, id: PlaylistId, is_favorite: bool) -> Result<()> {
        let result = self.playlists.set_favorite(id, is_favorite).await;
        swallow_not_found(result, "set favorite")
    }

    /// Flip a playlist's favorite flag. Returns the new value, or `None` if
    /// the playlist is gone.
    pub async fn toggle_playlist_favorite(&self, id: PlaylistId) -> Result<Option<bool>> {
        match self.playlists.toggle_favorite(id).await {
            Ok(is_favorite) => Ok(Some(is_favorite)),
            Err(StoreError::NotFound(_)) => {
                warn!(playlist.id = %id, "playlist not found for favorite toggle");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn set_sound_favorite(&self, id: SoundId, is_favorite: bool) -> Result<()> {
        self.sounds.set_favorite(id, is_favorite).await?;
        Ok(())
    }

    /// Flip a sound's favorite flag. Returns the new value, or `None` if the
    /// sound is unknown.
    pub async fn toggle_sound_favorite(&self, id: SoundId) -> Result<Option<bool>> {
        Ok(self.sounds.toggle_favorite(id).await?)
    }

    pub async fn add_sounds(&self, ids: Vec<SoundId>, playlist_id: PlaylistId) -> Result<()> {
        let result = self.playlists.add_sounds(ids, playlist_id).await.map(|_| ());
        swallow_not_found(result, "add sounds")
    }

    pub async fn remove_sound(&self, sound_id: SoundId, playlist_id: PlaylistId) -> Result<()> {
        let result = self
            .playlists
            .remove_sound(sound_id, playlist_id)
            .await
            .map(|_| ());
        swallow_not_found(result, "remove sound")
    }

    /// Toggle a playlist on the browse surface.
    pub fn toggle_expansion(&self, id: PlaylistId) -> bool {
        self.browse_expansion.toggle(id)
    }

    /// Toggle a playlist on the favorites surface.
    pub fn toggle_favorite_expansion(&self, id: PlaylistId) -> bool {
        self.favorites_expansion.toggle(id)
    }

    pub fn browse_expansion(&self) -> &ExpansionState {
        &self.browse_expansion
    }

    pub fn favorites_expansion(&self) -> &ExpansionState {
        &self.favorites_expansion
    }

    /// Row list over every playlist.
    pub fn browse(&self) -> ListController {
        ListController::spawn(
            self.playlists.subscribe(),
            self.browse_expansion.subscribe(),
            self.sounds.subscribe(),
            self.resolver(),
            MaterializeMode::All,
        )
    }

    /// Row list over favorited playlists.
    pub fn favorites(&self) -> ListController {
        ListController::spawn(
            self.playlists.subscribe_favorites(),
            self.favorites_expansion.subscribe(),
            self.sounds.subscribe(),
            self.resolver(),
            MaterializeMode::FavoritesOnly,
        )
    }

    /// Sounds of one playlist in playlist order; empty if it is gone.
    pub async fn playlist_sounds(&self, id: PlaylistId) -> Result<Vec<Sound>> {
        match self.playlists.get(id).await? {
            Some(playlist) => Ok(self.sounds.get_by_ids(playlist.sound_ids).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Every sound, for picking what to add to a playlist.
    pub fn all_sounds(&self) -> watch::Receiver<Snapshot<Sound>> {
        self.sounds.subscribe()
    }

    fn resolver(&self) -> Arc<dyn SoundResolver> {
        Arc::new(self.sounds.clone())
    }
}

fn swallow_not_found(result: std::result::Result<(), StoreError>, op: &'static str) -> Result<()> {
    match result {
        Err(StoreError::NotFound(id)) => {
            warn!(playlist.id = %id, op, "playlist not found, ignoring");
            Ok(())
        }
        other => other.map_err(LibraryError::from),
    }
}

//! Async stores with snapshot streams.
//!
//! Each store publishes its query results through `tokio::sync::watch`
//! channels. A mutation commits first, then re-runs the affected queries and
//! publishes the new snapshots, so subscribers only ever see committed state.
//!
//! Writes to one store pass through a FIFO write gate: they commit in the
//! order they were submitted, and two read-modify-writes of the same playlist
//! can never interleave.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::db::Database;
use crate::error::{Result, StoreError};
use crate::types::*;

/// Immutable point-in-time query result.
pub type Snapshot<T> = Arc<Vec<T>>;

/// Run a database call on the blocking pool.
pub(crate) async fn run_blocking<T, F>(db: &Arc<Database>, f: F) -> Result<T>
where
    F: FnOnce(&Database) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = Arc::clone(db);
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}

/// Replace the channel value only if it differs, so unchanged query results
/// do not wake subscribers.
fn publish<T: PartialEq>(tx: &watch::Sender<Snapshot<T>>, next: Vec<T>) -> bool {
    tx.send_if_modified(|current| {
        if current.as_slice() == next.as_slice() {
            false
        } else {
            *current = Arc::new(next);
            true
        }
    })
}

struct SoundInner {
    db: Arc<Database>,
    write_gate: Mutex<()>,
    all: watch::Sender<Snapshot<Sound>>,
    favorites: watch::Sender<Snapshot<Sound>>,
}

/// Durable table of sounds.
#[derive(Clone)]
pub struct SoundStore {
    inner: Arc<SoundInner>,
}

impl SoundStore {
    /// Build the store and load its initial snapshots.
    pub async fn open(db: Arc<Database>) -> Result<Self> {
        let (all, favorites) =
            run_blocking(&db, |db| Ok((db.list_sounds()?, db.favorite_sounds()?))).await?;

        Ok(Self {
            inner: Arc::new(SoundInner {
                db,
                write_gate: Mutex::new(()),
                all: watch::channel(Arc::new(all)).0,
                favorites: watch::channel(Arc::new(favorites)).0,
            }),
        })
    }

    /// Current snapshot of all sounds, name ascending.
    pub fn all(&self) -> Snapshot<Sound> {
        self.inner.all.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Sound>> {
        self.inner.all.subscribe()
    }

    /// Current snapshot of favorited sounds, name ascending.
    pub fn favorites(&self) -> Snapshot<Sound> {
        self.inner.favorites.borrow().clone()
    }

    pub fn subscribe_favorites(&self) -> watch::Receiver<Snapshot<Sound>> {
        self.inner.favorites.subscribe()
    }

    /// Sounds for `ids` in the order given; unknown ids are left out.
    pub async fn get_by_ids(&self, ids: Vec<SoundId>) -> Result<Vec<Sound>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        run_blocking(&self.inner.db, move |db| db.sounds_by_ids(&ids)).await
    }

    pub async fn count(&self) -> Result<usize> {
        run_blocking(&self.inner.db, |db| db.count_sounds()).await
    }

    /// Insert a sound; a duplicate id is ignored. Returns whether it was new.
    pub async fn insert(&self, sound: Sound) -> Result<bool> {
        let _gate = self.inner.write_gate.lock().await;
        let id = sound.id.clone();
        let inserted = run_blocking(&self.inner.db, move |db| db.insert_sound(&sound)).await?;
        if inserted {
            debug!(sound.id = %id, "sound inserted");
            self.refresh_after_commit().await;
        } else {
            debug!(sound.id = %id, "sound already present, insert ignored");
        }
        Ok(inserted)
    }

    /// Set a sound's favorite flag. Returns false if the sound does not exist.
    pub async fn set_favorite(&self, id: SoundId, is_favorite: bool) -> Result<bool> {
        let _gate = self.inner.write_gate.lock().await;
        let target = id.clone();
        let updated =
            run_blocking(&self.inner.db, move |db| db.set_sound_favorite(&target, is_favorite)).await?;
        if updated {
            debug!(sound.id = %id, is_favorite, "sound favorite updated");
            self.refresh_after_commit().await;
        } else {
            warn!(sound.id = %id, "sound not found for favorite update");
        }
        Ok(updated)
    }

    /// Flip a sound's favorite flag. Returns the new value, or `None` if the
    /// sound does not exist.
    pub async fn toggle_favorite(&self, id: SoundId) -> Result<Option<bool>> {
        let _gate = self.inner.write_gate.lock().await;
        let target = id.clone();
        let toggled =
            run_blocking(&self.inner.db, move |db| db.toggle_sound_favorite(&target)).await?;
        match toggled {
            Some(is_favorite) => {
                debug!(sound.id = %id, is_favorite, "sound favorite toggled");
                self.refresh_after_commit().await;
            }
            None => warn!(sound.id = %id, "sound not found for favorite toggle"),
        }
        Ok(toggled)
    }

    /// A committed write stands even if the re-query fails; the next
    /// successful refresh catches the snapshots up.
    async fn refresh_after_commit(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "sound snapshot refresh failed after commit");
        }
    }

    /// Re-run both queries and publish whatever changed.
    pub async fn refresh(&self) -> Result<()> {
        let (all, favorites) = run_blocking(&self.inner.db, |db| {
            Ok((db.list_sounds()?, db.favorite_sounds()?))
        })
        .await?;
        publish(&self.inner.all, all);
        publish(&self.inner.favorites, favorites);
        Ok(())
    }
}

struct PlaylistInner {
    db: Arc<Database>,
    write_gate: Mutex<()>,
    all: watch::Sender<Snapshot<Playlist>>,
    favorites: watch::Sender<Snapshot<Playlist>>,
}

/// Durable table of playlists.
///
/// The playlist limit is not enforced here; callers check it before `insert`.
#[derive(Clone)]
pub struct PlaylistStore {
    inner: Arc<PlaylistInner>,
}

impl PlaylistStore {
    /// Build the store and load its initial snapshots.
    pub async fn open(db: Arc<Database>) -> Result<Self> {
        let (all, favorites) =
            run_blocking(&db, |db| Ok((db.list_playlists()?, db.favorite_playlists()?))).await?;

        Ok(Self {
            inner: Arc::new(PlaylistInner {
                db,
                write_gate: Mutex::new(()),
                all: watch::channel(Arc::new(all)).0,
                favorites: watch::channel(Arc::new(favorites)).0,
            }),
        })
    }

    /// Current snapshot of all playlists, name ascending.
    pub fn all(&self) -> Snapshot<Playlist> {
        self.inner.all.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Playlist>> {
        self.inner.all.subscribe()
    }

    /// Current snapshot of favorited playlists, name ascending.
    pub fn favorites(&self) -> Snapshot<Playlist> {
        self.inner.favorites.borrow().clone()
    }

    pub fn subscribe_favorites(&self) -> watch::Receiver<Snapshot<Playlist>> {
        self.inner.favorites.subscribe()
    }

    /// Read a playlist straight from storage.
    pub async fn get(&self, id: PlaylistId) -> Result<Option<Playlist>> {
        run_blocking(&self.inner.db, move |db| db.get_playlist(id)).await
    }

    pub async fn count(&self) -> Result<usize> {
        run_blocking(&self.inner.db, |db| db.count_playlists()).await
    }

    /// Create an empty playlist.
    pub async fn insert(&self, name: &str) -> Result<Playlist> {
        if is_blank(name) {
            return Err(StoreError::Validation("playlist name must not be blank".to_string()));
        }
        let _gate = self.inner.write_gate.lock().await;
        let name = name.to_string();
        let playlist = run_blocking(&self.inner.db, move |db| db.insert_playlist(&name)).await?;
        debug!(playlist.id = %playlist.id, playlist.name = %playlist.name, "playlist created");
        self.refresh_after_commit().await;
        Ok(playlist)
    }

    /// Delete a playlist. Returns false if it was already gone.
    pub async fn delete(&self, id: PlaylistId) -> Result<bool> {
        let _gate = self.inner.write_gate.lock().await;
        let deleted = run_blocking(&self.inner.db, move |db| db.delete_playlist(id)).await?;
        if deleted {
            debug!(playlist.id = %id, "playlist deleted");
            self.refresh_after_commit().await;
        }
        Ok(deleted)
    }

    pub async fn rename(&self, id: PlaylistId, new_name: &str) -> Result<()> {
        if is_blank(new_name) {
            return Err(StoreError::Validation("playlist name must not be blank".to_string()));
        }
        let _gate = self.inner.write_gate.lock().await;
        let new_name = new_name.to_string();
        run_blocking(&self.inner.db, move |db| db.rename_playlist(id, &new_name)).await?;
        debug!(playlist.id = %id, "playlist renamed");
        self.refresh_after_commit().await;
        Ok(())
    }

    pub async fn set_favorite(&self, id: PlaylistId, is_favorite: bool) -> Result<()> {
        let _gate = self.inner.write_gate.lock().await;
        run_blocking(&self.inner.db, move |db| db.set_playlist_favorite(id, is_favorite)).await?;
        debug!(playlist.id = %id, is_favorite, "playlist favorite updated");
        self.refresh_after_commit().await;
        Ok(())
    }

    /// Flip a playlist's favorite flag and return the new value.
    pub async fn toggle_favorite(&self, id: PlaylistId) -> Result<bool> {
        let _gate = self.inner.write_gate.lock().await;
        let is_favorite =
            run_blocking(&self.inner.db, move |db| db.toggle_playlist_favorite(id)).await?;
        debug!(playlist.id = %id, is_favorite, "playlist favorite toggled");
        self.refresh_after_commit().await;
        Ok(is_favorite)
    }

    /// Append the ids the playlist does not contain yet, in the order given.
    /// Returns whether the playlist changed.
    pub async fn add_sounds(&self, ids: Vec<SoundId>, playlist_id: PlaylistId) -> Result<bool> {
        if ids.is_empty() {
            return Ok(false);
        }
        let _gate = self.inner.write_gate.lock().await;
        let count = ids.len();
        let changed =
            run_blocking(&self.inner.db, move |db| db.add_sounds_to_playlist(playlist_id, &ids)).await?;
        if changed {
            debug!(playlist.id = %playlist_id, requested = count, "sounds added to playlist");
            self.refresh_after_commit().await;
        } else {
            debug!(playlist.id = %playlist_id, "no new sounds for playlist");
        }
        Ok(changed)
    }

    /// Remove a sound from the playlist. Returns whether it was present.
    pub async fn remove_sound(&self, sound_id: SoundId, playlist_id: PlaylistId) -> Result<bool> {
        let _gate = self.inner.write_gate.lock().await;
        let target = sound_id.clone();
        let removed = run_blocking(&self.inner.db, move |db| {
            db.remove_sound_from_playlist(playlist_id, &target)
        })
        .await?;
        if removed {
            debug!(playlist.id = %playlist_id, sound.id = %sound_id, "sound removed from playlist");
            self.refresh_after_commit().await;
        } else {
            debug!(playlist.id = %playlist_id, sound.id = %sound_id, "sound was not in playlist");
        }
        Ok(removed)
    }

    async fn refresh_after_commit(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "playlist snapshot refresh failed after commit");
        }
    }

    /// Re-run both queries and publish whatever changed.
    pub async fn refresh(&self) -> Result<()> {
        let (all, favorites) = run_blocking(&self.inner.db, |db| {
            Ok((db.list_playlists()?, db.favorite_playlists()?))
        })
        .await?;
        publish(&self.inner.all, all);
        publish(&self.inner.favorites, favorites);
        Ok(())
    }
}

//! SQLite tables for sounds and playlists.
//!
//! Everything here is synchronous; the async stores in [`crate::store`] run
//! these calls on tokio's blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension, Row, TransactionBehavior};

use crate::error::{Result, StoreError};
use crate::types::*;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sounds (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    file_path TEXT NOT NULL,
    is_favorite INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_sounds_name ON sounds(name);

CREATE TABLE IF NOT EXISTS playlists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    sound_ids TEXT NOT NULL DEFAULT '[]',
    is_favorite INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_playlists_name ON playlists(name);
"#;

/// Bound parameters per `IN (...)` query, below SQLite's variable limit.
const MAX_IN_PARAMS: usize = 500;

const SOUND_COLUMNS: &str = "id, name, file_path, is_favorite";
const PLAYLIST_COLUMNS: &str = "id, name, sound_ids, is_favorite";

/// Database wrapper with connection-per-call pattern.
pub struct Database {
    path: PathBuf,
    /// In-memory databases keep one connection, since every new
    /// `:memory:` connection is a fresh, empty database.
    memory_conn: Option<Mutex<Connection>>,
}

impl Database {
    /// Open database at path, creating it and its parent directory if necessary.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Self {
            path,
            memory_conn: None,
        };
        db.with_conn(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })?;
        tracing::debug!(path = %db.path.display(), "library database opened");
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            memory_conn: Some(Mutex::new(conn)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;
        Ok(conn)
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        if let Some(ref mutex) = self.memory_conn {
            let mut conn = mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&mut conn)
        } else {
            let mut conn = self.connect()?;
            f(&mut conn)
        }
    }

    // --- Sounds ---

    /// Insert a sound. Returns false if a sound with that id already existed.
    pub fn insert_sound(&self, sound: &Sound) -> Result<bool> {
        self.with_conn(|conn| {
            let rows = conn.execute(
                "INSERT OR IGNORE INTO sounds (id, name, file_path, is_favorite) VALUES (?1, ?2, ?3, ?4)",
                params![sound.id.as_str(), sound.name, sound.file_path, sound.is_favorite],
            )?;
            Ok(rows > 0)
        })
    }

    /// All sounds, name ascending.
    pub fn list_sounds(&self) -> Result<Vec<Sound>> {
        self.query_sounds(&format!("SELECT {SOUND_COLUMNS} FROM sounds ORDER BY name ASC, id ASC"))
    }

    /// Favorited sounds, name ascending.
    pub fn favorite_sounds(&self) -> Result<Vec<Sound>> {
        self.query_sounds(&format!(
            "SELECT {SOUND_COLUMNS} FROM sounds WHERE is_favorite = 1 ORDER BY name ASC, id ASC"
        ))
    }

    fn query_sounds(&self, sql: &str) -> Result<Vec<Sound>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map([], sound_from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    /// Look up sounds by id.
    ///
    /// The result follows the order of `ids`. Ids without a row are omitted
    /// and repeated ids resolve once.
    pub fn sounds_by_ids(&self, ids: &[SoundId]) -> Result<Vec<Sound>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut found = std::collections::HashMap::with_capacity(ids.len());
        self.with_conn(|conn| {
            for chunk in ids.chunks(MAX_IN_PARAMS) {
                let placeholders = vec!["?"; chunk.len()].join(", ");
                let sql = format!("SELECT {SOUND_COLUMNS} FROM sounds WHERE id IN ({placeholders})");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(chunk.iter().map(|id| id.as_str())), sound_from_row)?;
                for row in rows {
                    let sound = row?;
                    found.insert(sound.id.clone(), sound);
                }
            }
            Ok(())
        })?;

        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }

    /// Set a sound's favorite flag. Returns false if no such sound exists.
    pub fn set_sound_favorite(&self, id: &SoundId, is_favorite: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let rows = conn.execute(
                "UPDATE sounds SET is_favorite = ?1 WHERE id = ?2",
                params![is_favorite, id.as_str()],
            )?;
            Ok(rows > 0)
        })
    }

    /// Flip a sound's favorite flag in one statement. Returns the new value,
    /// or `None` if no such sound exists.
    pub fn toggle_sound_favorite(&self, id: &SoundId) -> Result<Option<bool>> {
        self.with_conn(|conn| {
            conn.query_row(
                "UPDATE sounds SET is_favorite = NOT is_favorite WHERE id = ?1 RETURNING is_favorite",
                [id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
        })
    }

    pub fn count_sounds(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM sounds", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    // --- Playlists ---

    /// Create an empty playlist.
    pub fn insert_playlist(&self, name: &str) -> Result<Playlist> {
        self.insert_playlist_with_sounds(name, &[])
    }

    /// Create a playlist with initial members (duplicates dropped).
    pub fn insert_playlist_with_sounds(&self, name: &str, sound_ids: &[SoundId]) -> Result<Playlist> {
        if is_blank(name) {
            return Err(StoreError::Validation("playlist name must not be blank".to_string()));
        }
        let mut members: Vec<SoundId> = Vec::with_capacity(sound_ids.len());
        append_missing(&mut members, sound_ids);
        let encoded = encode_sound_ids(&members)?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO playlists (name, sound_ids) VALUES (?1, ?2)",
                params![name, encoded],
            )?;
            Ok(Playlist {
                id: PlaylistId(conn.last_insert_rowid()),
                name: name.to_string(),
                sound_ids: members,
                is_favorite: false,
            })
        })
    }

    pub fn get_playlist(&self, id: PlaylistId) -> Result<Option<Playlist>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = ?1"),
                [id.0],
                playlist_from_row,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    /// All playlists, name ascending.
    pub fn list_playlists(&self) -> Result<Vec<Playlist>> {
        self.query_playlists(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists ORDER BY name ASC, id ASC"
        ))
    }

    /// Favorited playlists, name ascending.
    pub fn favorite_playlists(&self) -> Result<Vec<Playlist>> {
        self.query_playlists(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE is_favorite = 1 ORDER BY name ASC, id ASC"
        ))
    }

    fn query_playlists(&self, sql: &str) -> Result<Vec<Playlist>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map([], playlist_from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    pub fn count_playlists(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM playlists", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    /// Delete a playlist. Returns false if it did not exist.
    pub fn delete_playlist(&self, id: PlaylistId) -> Result<bool> {
        self.with_conn(|conn| {
            let rows = conn.execute("DELETE FROM playlists WHERE id = ?1", [id.0])?;
            Ok(rows > 0)
        })
    }

    pub fn rename_playlist(&self, id: PlaylistId, new_name: &str) -> Result<()> {
        if is_blank(new_name) {
            return Err(StoreError::Validation("playlist name must not be blank".to_string()));
        }
        self.with_conn(|conn| {
            let rows = conn.execute(
                "UPDATE playlists SET name = ?1 WHERE id = ?2",
                params![new_name, id.0],
            )?;
            if rows == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
    }

    pub fn set_playlist_favorite(&self, id: PlaylistId, is_favorite: bool) -> Result<()> {
        self.with_conn(|conn| {
            let rows = conn.execute(
                "UPDATE playlists SET is_favorite = ?1 WHERE id = ?2",
                params![is_favorite, id.0],
            )?;
            if rows == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
    }

    /// Flip a playlist's favorite flag in one statement. Returns the new value.
    pub fn toggle_playlist_favorite(&self, id: PlaylistId) -> Result<bool> {
        self.with_conn(|conn| {
            conn.query_row(
                "UPDATE playlists SET is_favorite = NOT is_favorite WHERE id = ?1 RETURNING is_favorite",
                [id.0],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))
        })
    }

    /// Append the ids not yet in the playlist, keeping existing order.
    ///
    /// One read-modify-write inside an IMMEDIATE transaction. Returns whether
    /// the stored list changed.
    pub fn add_sounds_to_playlist(&self, id: PlaylistId, sound_ids: &[SoundId]) -> Result<bool> {
        if sound_ids.is_empty() {
            return Ok(false);
        }
        self.modify_sound_ids(id, |members| append_missing(members, sound_ids))
    }

    /// Remove one sound from the playlist. Returns whether it was present.
    pub fn remove_sound_from_playlist(&self, id: PlaylistId, sound_id: &SoundId) -> Result<bool> {
        self.modify_sound_ids(id, |members| {
            let before = members.len();
            members.retain(|member| member != sound_id);
            members.len() != before
        })
    }

    fn modify_sound_ids<F>(&self, id: PlaylistId, modify: F) -> Result<bool>
    where
        F: FnOnce(&mut Vec<SoundId>) -> bool,
    {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let raw: Option<String> = tx
                .query_row("SELECT sound_ids FROM playlists WHERE id = ?1", [id.0], |row| row.get(0))
                .optional()?;
            let Some(raw) = raw else {
                return Err(StoreError::NotFound(id));
            };

            let mut members = decode_sound_ids(&raw)?;
            if !modify(&mut members) {
                return Ok(false);
            }

            tx.execute(
                "UPDATE playlists SET sound_ids = ?1 WHERE id = ?2",
                params![encode_sound_ids(&members)?, id.0],
            )?;
            tx.commit()?;
            Ok(true)
        })
    }
}

/// Push each id of `additions` that `members` lacks. Returns whether anything was added.
fn append_missing(members: &mut Vec<SoundId>, additions: &[SoundId]) -> bool {
    let mut changed = false;
    for id in additions {
        if !members.contains(id) {
            members.push(id.clone());
            changed = true;
        }
    }
    changed
}

fn sound_from_row(row: &Row<'_>) -> rusqlite::Result<Sound> {
    Ok(Sound {
        id: SoundId(row.get(0)?),
        name: row.get(1)?,
        file_path: row.get(2)?,
        is_favorite: row.get(3)?,
    })
}

fn playlist_from_row(row: &Row<'_>) -> rusqlite::Result<Playlist> {
    let raw: String = row.get(2)?;
    let sound_ids = decode_sound_ids(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    Ok(Playlist {
        id: PlaylistId(row.get(0)?),
        name: row.get(1)?,
        sound_ids,
        is_favorite: row.get(3)?,
    })
}

use shelfconf::SeedConfig;
use tracing::info;

use crate::db::Database;
use crate::error::Result;
use crate::types::{Sound, SoundId};

/// Insert the seed contents when the library has no sounds yet.
///
/// Returns whether anything was seeded. Running it against a populated
/// library is a no-op, so it is safe to call on every open.
pub fn populate(db: &Database, seed: &SeedConfig) -> Result<bool> {
    if db.count_sounds()? > 0 {
        return Ok(false);
    }
    if seed.sounds.is_empty() && seed.playlist.is_none() {
        return Ok(false);
    }

    for s in &seed.sounds {
        db.insert_sound(&Sound::new(s.id.as_str(), s.name.as_str(), s.file_path.as_str()))?;
    }

    if let Some(playlist) = &seed.playlist {
        let ids: Vec<SoundId> = playlist.sound_ids.iter().map(|id| SoundId::new(id.as_str())).collect();
        db.insert_playlist_with_sounds(&playlist.name, &ids)?;
    }

    info!(
        sounds = seed.sounds.len(),
        playlist = seed.playlist.as_ref().map(|p| p.name.as_str()),
        "seeded empty library"
    );
    Ok(true)
}

//! Row materialization against the real sound store.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use pretty_assertions::assert_eq;
use shelfdb::{Database, SoundStore};
use soundshelf::{materialize, DisplayRow, MaterializeMode, Playlist, PlaylistId, Sound, SoundId};

async fn sound_store(sounds: &[(&str, &str)]) -> Result<SoundStore> {
    let store = SoundStore::open(Arc::new(Database::open_memory()?)).await?;
    for (id, name) in sounds {
        store.insert(Sound::new(*id, *name, "x")).await?;
    }
    Ok(store)
}

fn playlist(id: i64, name: &str, ids: &[&str]) -> Playlist {
    Playlist {
        id: PlaylistId(id),
        name: name.to_string(),
        sound_ids: ids.iter().map(|s| SoundId::from(*s)).collect(),
        is_favorite: false,
    }
}

fn header(id: i64, name: &str, is_expanded: bool) -> DisplayRow {
    DisplayRow::Header {
        playlist_id: PlaylistId(id),
        playlist_name: name.to_string(),
        is_expanded,
        is_favorite: false,
    }
}

fn sound_row(id: &str, name: &str, parent: i64) -> DisplayRow {
    DisplayRow::Sound {
        sound: Sound::new(id, name, "x"),
        parent_playlist_id: PlaylistId(parent),
    }
}

fn keys(rows: &[DisplayRow]) -> Vec<String> {
    rows.iter().map(DisplayRow::key).collect()
}

#[tokio::test]
async fn children_follow_playlist_order_not_store_order() -> Result<()> {
    // Store order by name is c, b, a.
    let store = sound_store(&[("a", "Zulu"), ("b", "Mike"), ("c", "Alpha")]).await?;
    let playlists = vec![playlist(1, "Mix", &["a", "b", "c"])];
    let expansion = HashMap::from([(PlaylistId(1), true)]);

    let rows = materialize(&playlists, &expansion, &store, MaterializeMode::All).await?;
    assert_eq!(
        keys(&rows),
        vec!["header_1", "sound_1_a", "sound_1_b", "sound_1_c"]
    );
    Ok(())
}

#[tokio::test]
async fn dangling_ids_produce_no_rows() -> Result<()> {
    let store = sound_store(&[("rain", "Rain")]).await?;
    let playlists = vec![playlist(1, "Mix", &["gone", "rain", "also_gone"])];
    let expansion = HashMap::from([(PlaylistId(1), true)]);

    let rows = materialize(&playlists, &expansion, &store, MaterializeMode::All).await?;
    assert_eq!(keys(&rows), vec!["header_1", "sound_1_rain"]);
    Ok(())
}

#[tokio::test]
async fn collapsed_playlists_have_no_children() -> Result<()> {
    let store = sound_store(&[("rain", "Rain"), ("forest", "Forest")]).await?;
    let playlists = vec![
        playlist(1, "Chill", &["rain", "forest"]),
        playlist(2, "Deep", &["forest"]),
    ];
    let expansion = HashMap::from([(PlaylistId(1), false)]);

    let rows = materialize(&playlists, &expansion, &store, MaterializeMode::All).await?;
    assert_eq!(rows, vec![header(1, "Chill", false), header(2, "Deep", false)]);
    Ok(())
}

#[tokio::test]
async fn repeated_runs_give_identical_keys() -> Result<()> {
    let store = sound_store(&[("rain", "Rain"), ("forest", "Forest")]).await?;
    let playlists = vec![
        playlist(1, "Chill", &["rain", "forest"]),
        playlist(2, "Deep", &["forest", "rain"]),
    ];
    let expansion = HashMap::from([(PlaylistId(1), true), (PlaylistId(2), true)]);

    let first = materialize(&playlists, &expansion, &store, MaterializeMode::All).await?;
    let second = materialize(&playlists, &expansion, &store, MaterializeMode::All).await?;
    assert_eq!(keys(&first), keys(&second));
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn expanded_chill_lists_its_sounds() -> Result<()> {
    let store = sound_store(&[("rain", "Rain"), ("forest", "Forest")]).await?;
    let playlists = vec![playlist(1, "Chill", &["rain", "forest"])];
    let expansion = HashMap::from([(PlaylistId(1), true)]);

    let rows = materialize(&playlists, &expansion, &store, MaterializeMode::All).await?;
    assert_eq!(
        rows,
        vec![
            header(1, "Chill", true),
            sound_row("rain", "Rain", 1),
            sound_row("forest", "Forest", 1),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn default_expansion_shows_header_only() -> Result<()> {
    let store = sound_store(&[("rain", "Rain"), ("forest", "Forest")]).await?;
    let playlists = vec![playlist(1, "Chill", &["rain", "forest"])];

    let rows = materialize(&playlists, &HashMap::new(), &store, MaterializeMode::All).await?;
    assert_eq!(rows, vec![header(1, "Chill", false)]);
    Ok(())
}

#[tokio::test]
async fn empty_expanded_playlist_is_header_only() -> Result<()> {
    let store = sound_store(&[]).await?;
    let playlists = vec![playlist(1, "Empty", &[])];
    let expansion = HashMap::from([(PlaylistId(1), true)]);

    let rows = materialize(&playlists, &expansion, &store, MaterializeMode::All).await?;
    assert_eq!(rows, vec![header(1, "Empty", true)]);
    Ok(())
}

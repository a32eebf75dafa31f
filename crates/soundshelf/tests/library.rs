//! End-to-end library behavior: mutations flowing into live row lists.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pretty_assertions::assert_eq;
use shelfconf::{LimitsConfig, SeedConfig, ShelfConfig};
use shelfdb::Database;
use soundshelf::{
    apply, diff_rows, DisplayRow, Library, LibraryError, ListController, Published, Sound, SoundId,
};
use tempfile::TempDir;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

async fn memory_library() -> Result<Library> {
    let db = Arc::new(Database::open_memory()?);
    Ok(Library::new(db, LimitsConfig::default()).await?)
}

async fn chill_library() -> Result<(Library, soundshelf::PlaylistId)> {
    let lib = memory_library().await?;
    lib.sounds().insert(Sound::new("rain", "Rain", "x")).await?;
    lib.sounds().insert(Sound::new("forest", "Forest", "x")).await?;
    let chill = lib.create_playlist("Chill").await?;
    lib.add_sounds(vec![SoundId::from("rain"), SoundId::from("forest")], chill.id)
        .await?;
    Ok((lib, chill.id))
}

/// Wait until the controller publishes rows matching `pred`.
async fn rows_matching(
    controller: &ListController,
    pred: impl Fn(&[DisplayRow]) -> bool,
) -> Result<Published> {
    let mut rx = controller.subscribe();
    let published = timeout(WAIT, rx.wait_for(|p| pred(&p.rows))).await??;
    Ok(published.clone())
}

fn keys(rows: &[DisplayRow]) -> Vec<String> {
    rows.iter().map(DisplayRow::key).collect()
}

#[tokio::test]
async fn removing_a_sound_updates_expanded_list() -> Result<()> {
    let (lib, chill) = chill_library().await?;
    let browse = lib.browse();
    lib.toggle_expansion(chill);

    let before = rows_matching(&browse, |rows| rows.len() == 3).await?;
    assert_eq!(
        keys(&before.rows),
        vec!["header_1", "sound_1_rain", "sound_1_forest"]
    );

    lib.remove_sound(SoundId::from("rain"), chill).await?;
    let after = rows_matching(&browse, |rows| rows.len() == 2).await?;
    assert_eq!(keys(&after.rows), vec!["header_1", "sound_1_forest"]);
    assert!(after.generation > before.generation);
    Ok(())
}

#[tokio::test]
async fn sixth_playlist_is_rejected() -> Result<()> {
    let lib = memory_library().await?;
    for i in 0..5 {
        lib.create_playlist(&format!("Mix {i}")).await?;
    }

    let err = lib.create_playlist("One too many").await.unwrap_err();
    assert!(matches!(err, LibraryError::LimitReached { limit: 5 }));
    assert_eq!(lib.playlists().count().await?, 5);
    assert!(lib.playlists().all().iter().all(|p| p.name != "One too many"));
    Ok(())
}

#[tokio::test]
async fn add_sounds_skips_present_ids() -> Result<()> {
    let lib = memory_library().await?;
    let mix = lib.create_playlist("Mix").await?;
    lib.add_sounds(vec![SoundId::from("a"), SoundId::from("x")], mix.id)
        .await?;
    lib.add_sounds(vec![SoundId::from("x"), SoundId::from("y")], mix.id)
        .await?;

    let stored = lib.playlists().get(mix.id).await?.expect("playlist exists");
    assert_eq!(
        stored.sound_ids,
        vec![SoundId::from("a"), SoundId::from("x"), SoundId::from("y")]
    );
    Ok(())
}

#[tokio::test]
async fn sound_favorite_refreshes_child_rows() -> Result<()> {
    let (lib, chill) = chill_library().await?;
    let browse = lib.browse();
    lib.toggle_expansion(chill);
    rows_matching(&browse, |rows| rows.len() == 3).await?;

    lib.set_sound_favorite(SoundId::from("forest"), true).await?;
    rows_matching(&browse, |rows| {
        rows.iter().any(|row| {
            matches!(row, DisplayRow::Sound { sound, .. } if sound.id.as_str() == "forest" && sound.is_favorite)
        })
    })
    .await?;
    Ok(())
}

#[tokio::test]
async fn favorites_surface_tracks_flag() -> Result<()> {
    let (lib, chill) = chill_library().await?;
    let other = lib.create_playlist("Other").await?;
    let favorites = lib.favorites();

    lib.set_playlist_favorite(chill, true).await?;
    let shown = rows_matching(&favorites, |rows| rows.len() == 1).await?;
    assert_eq!(keys(&shown.rows), vec![format!("header_{chill}")]);

    lib.toggle_favorite_expansion(chill);
    let expanded = rows_matching(&favorites, |rows| rows.len() == 3).await?;
    assert!(expanded.rows.iter().all(|row| row.playlist_id() == chill));

    // The browse surface keeps its own flags.
    assert!(!lib.browse_expansion().is_expanded(chill));
    assert!(lib.browse_expansion().snapshot().get(&other.id).is_none());

    lib.toggle_playlist_favorite(chill).await?;
    rows_matching(&favorites, |rows| rows.is_empty()).await?;
    Ok(())
}

#[tokio::test]
async fn rename_and_delete_flow_into_browse() -> Result<()> {
    let (lib, chill) = chill_library().await?;
    let deep = lib.create_playlist("Deep").await?;
    let browse = lib.browse();

    let initial = rows_matching(&browse, |rows| rows.len() == 2).await?;
    assert_eq!(
        keys(&initial.rows),
        vec![format!("header_{chill}"), format!("header_{}", deep.id)]
    );

    lib.rename_playlist(chill, "Zen").await?;
    let renamed = rows_matching(&browse, |rows| {
        rows.last().map(|r| r.playlist_id()) == Some(chill)
    })
    .await?;

    lib.delete_playlist(deep.id).await?;
    let deleted = rows_matching(&browse, |rows| rows.len() == 1).await?;

    // Consumers can patch their copy with keyed changes.
    let mut shown: Vec<DisplayRow> = initial.rows.to_vec();
    apply(&mut shown, &diff_rows(&initial.rows, &renamed.rows));
    assert_eq!(shown, *renamed.rows);
    apply(&mut shown, &diff_rows(&renamed.rows, &deleted.rows));
    assert_eq!(shown, *deleted.rows);
    Ok(())
}

#[tokio::test]
async fn open_seeds_a_fresh_library() -> Result<()> {
    let dir = TempDir::new()?;
    let mut config = ShelfConfig::default();
    config.infra.paths.state_dir = dir.path().to_path_buf();

    {
        let lib = Library::open(&config).await?;
        let names: Vec<String> = lib.sounds().all().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["Forest".to_string(), "Strong Rain".to_string()]);

        let playlists = lib.playlists().all();
        let mix = &playlists[0];
        assert_eq!(mix.name, "My First Mix");
        let sounds = lib.playlist_sounds(mix.id).await?;
        assert_eq!(sounds.len(), 1);
        assert_eq!(sounds[0].id, SoundId::from("rain_strong_1"));
    }

    // Reopening leaves user changes in place.
    config.bootstrap.seed = SeedConfig::empty();
    let lib = Library::open(&config).await?;
    assert_eq!(lib.playlists().count().await?, 1);
    assert_eq!(lib.sounds().count().await?, 2);
    Ok(())
}

#[tokio::test]
async fn open_reports_unusable_state_dir() -> Result<()> {
    let dir = TempDir::new()?;
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"")?;

    let mut config = ShelfConfig::default();
    config.infra.paths.state_dir = blocker.join("state");

    let err = Library::open(&config).await.err().expect("open must fail");
    assert!(format!("{err:#}").contains("Failed to open library database"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn paired_favorite_toggles_cancel_out() -> Result<()> {
    let lib = Arc::new(memory_library().await?);
    lib.sounds().insert(Sound::new("rain", "Rain", "x")).await?;
    let chill = lib.create_playlist("Chill").await?.id;
    let rain = SoundId::from("rain");

    for round in 0..50 {
        let (a, b) = (Arc::clone(&lib), Arc::clone(&lib));
        let first = tokio::spawn(async move { a.toggle_playlist_favorite(chill).await });
        let second = tokio::spawn(async move { b.toggle_playlist_favorite(chill).await });
        first.await??;
        second.await??;

        let (a, b) = (Arc::clone(&lib), Arc::clone(&lib));
        let (ra, rb) = (rain.clone(), rain.clone());
        let first = tokio::spawn(async move { a.toggle_sound_favorite(ra).await });
        let second = tokio::spawn(async move { b.toggle_sound_favorite(rb).await });
        first.await??;
        second.await??;

        let playlist = lib.playlists().get(chill).await?.expect("playlist exists");
        assert!(!playlist.is_favorite, "playlist toggle lost in round {round}");
        let sound = &lib.sounds().get_by_ids(vec![rain.clone()]).await?[0];
        assert!(!sound.is_favorite, "sound toggle lost in round {round}");
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_stop_at_limit() -> Result<()> {
    let lib = Arc::new(memory_library().await?);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let lib = Arc::clone(&lib);
            tokio::spawn(async move { lib.create_playlist(&format!("Mix {i}")).await })
        })
        .collect();

    let (mut created, mut rejected) = (0, 0);
    for handle in handles {
        match handle.await? {
            Ok(_) => created += 1,
            Err(LibraryError::LimitReached { limit: 5 }) => rejected += 1,
            Err(e) => return Err(e.into()),
        }
    }

    assert_eq!((created, rejected), (5, 5));
    assert_eq!(lib.playlists().count().await?, 5);
    assert_eq!(lib.playlists().all().len(), 5);
    Ok(())
}

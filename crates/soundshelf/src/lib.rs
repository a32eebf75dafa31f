//! soundshelf - sound clips, playlists and favorites.
//!
//! The library keeps sounds and playlists in SQLite (see `shelfdb`) and turns
//! them into flat display lists: one header row per playlist, followed by
//! its sounds when the playlist is expanded. A [`ListController`] keeps such
//! a list current as playlists, sounds or expansion flags change.
//!
//! ```rust,no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use soundshelf::{Library, ShelfConfig};
//!
//! let config = ShelfConfig::load()?;
//! soundshelf::telemetry::init(&config.infra.telemetry.log_level)?;
//!
//! let library = Library::open(&config).await?;
//! let browse = library.browse();
//! let chill = library.create_playlist("Chill").await?;
//! library.toggle_expansion(chill.id);
//! println!("{} rows", browse.current().rows.len());
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod diff;
pub mod expansion;
pub mod library;
pub mod materializer;
pub mod row;
pub mod telemetry;

pub use controller::{ControllerState, ListController, Published};
pub use diff::{apply, diff_rows, RowChange};
pub use expansion::{ExpansionMap, ExpansionState};
pub use library::{Library, LibraryError};
pub use materializer::{materialize, MaterializeMode, SoundResolver};
pub use row::DisplayRow;

pub use shelfconf::ShelfConfig;
pub use shelfdb::{Playlist, PlaylistId, Snapshot, Sound, SoundId, StoreError};

//! Persistent sound and playlist stores.
//!
//! `Database` is the synchronous SQLite layer. `SoundStore` and
//! `PlaylistStore` wrap it for async callers and publish every query result
//! as an immutable snapshot through a `watch` channel.

pub mod db;
pub mod error;
pub mod favorites;
pub mod seed;
pub mod store;
pub mod types;

pub use db::Database;
pub use error::{Result, StoreError};
pub use favorites::FavoritesIndex;
pub use store::{PlaylistStore, Snapshot, SoundStore};
pub use types::*;

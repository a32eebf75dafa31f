//! Per-surface expand/collapse flags.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use shelfdb::PlaylistId;
use tokio::sync::watch;
use tracing::debug;

/// Whole expansion map as published to subscribers.
pub type ExpansionMap = Arc<HashMap<PlaylistId, bool>>;

/// In-memory map from playlist id to its expanded flag.
///
/// Absent ids read as collapsed. Nothing here is persisted; every change
/// publishes the entire map.
pub struct ExpansionState {
    tx: watch::Sender<ExpansionMap>,
}

impl Default for ExpansionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpansionState {
    pub fn new() -> Self {
        Self {
            tx: watch::channel(Arc::new(HashMap::new())).0,
        }
    }

    /// Flip the flag for `id` and return the new value.
    pub fn toggle(&self, id: PlaylistId) -> bool {
        let mut expanded = false;
        self.tx.send_modify(|map| {
            let map = Arc::make_mut(map);
            let entry = map.entry(id).or_insert(false);
            *entry = !*entry;
            expanded = *entry;
        });
        debug!(playlist.id = %id, expanded, "expansion toggled");
        expanded
    }

    pub fn is_expanded(&self, id: PlaylistId) -> bool {
        self.tx.borrow().get(&id).copied().unwrap_or(false)
    }

    /// Drop the entry for a deleted playlist.
    pub fn forget(&self, id: PlaylistId) {
        self.tx.send_if_modified(|map| {
            if !map.contains_key(&id) {
                return false;
            }
            Arc::make_mut(map).remove(&id);
            true
        });
    }

    /// Keep only entries whose playlist still exists.
    pub fn retain(&self, live: &HashSet<PlaylistId>) {
        self.tx.send_if_modified(|map| {
            if map.keys().all(|id| live.contains(id)) {
                return false;
            }
            Arc::make_mut(map).retain(|id, _| live.contains(id));
            true
        });
    }

    pub fn snapshot(&self) -> ExpansionMap {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExpansionMap> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_collapsed() {
        let state = ExpansionState::new();
        assert!(!state.is_expanded(PlaylistId(1)));
    }

    #[test]
    fn test_toggle_twice_restores() {
        let state = ExpansionState::new();
        let id = PlaylistId(3);
        let before = state.is_expanded(id);

        assert!(state.toggle(id));
        assert!(!state.toggle(id));
        assert_eq!(state.is_expanded(id), before);

        state.toggle(id);
        let before = state.is_expanded(id);
        state.toggle(id);
        state.toggle(id);
        assert_eq!(state.is_expanded(id), before);
    }

    #[test]
    fn test_toggle_publishes_whole_map() {
        let state = ExpansionState::new();
        let mut rx = state.subscribe();
        rx.borrow_and_update();

        state.toggle(PlaylistId(1));
        state.toggle(PlaylistId(2));

        assert!(rx.has_changed().unwrap());
        let map = rx.borrow_and_update().clone();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&PlaylistId(1)), Some(&true));
    }

    #[test]
    fn test_published_maps_are_not_mutated() {
        let state = ExpansionState::new();
        state.toggle(PlaylistId(1));
        let old = state.snapshot();
        state.toggle(PlaylistId(1));

        assert_eq!(old.get(&PlaylistId(1)), Some(&true));
        assert!(!state.is_expanded(PlaylistId(1)));
    }

    #[test]
    fn test_forget_and_retain() {
        let state = ExpansionState::new();
        state.toggle(PlaylistId(1));
        state.toggle(PlaylistId(2));
        state.toggle(PlaylistId(3));

        let mut rx = state.subscribe();
        rx.borrow_and_update();
        state.forget(PlaylistId(9));
        assert!(!rx.has_changed().unwrap());

        state.forget(PlaylistId(1));
        assert!(rx.has_changed().unwrap());

        let live: HashSet<PlaylistId> = [PlaylistId(3)].into_iter().collect();
        state.retain(&live);
        let map = state.snapshot();
        assert_eq!(map.len(), 1);
        assert!(state.is_expanded(PlaylistId(3)));
    }
}

//! Keeps a materialized row list in step with its sources.
//!
//! A driver task watches the playlist snapshot, the expansion map and the
//! sound snapshot. Every change starts a new recomputation tagged with a
//! generation number. Results come back over a channel, and only the one
//! matching the newest generation is published; anything older is dropped on
//! arrival. Recomputations live in a task set owned by the driver, so
//! stopping the driver cancels them.

use std::sync::Arc;

use shelfdb::{Playlist, Snapshot, Sound, StoreError};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use crate::expansion::ExpansionMap;
use crate::materializer::{materialize, MaterializeMode, SoundResolver};
use crate::row::DisplayRow;

/// Where the controller is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Holding the last published rows.
    Idle,
    /// A recomputation for `generation` is outstanding.
    Recomputing { generation: u64 },
}

/// A published row list and the generation that produced it.
///
/// Generation 0 is the empty list present before the first result.
#[derive(Debug, Clone, Default)]
pub struct Published {
    pub generation: u64,
    pub rows: Arc<Vec<DisplayRow>>,
}

type Outcome = (u64, Result<Vec<DisplayRow>, StoreError>);

/// Handle to a running controller. Dropping it stops the driver.
pub struct ListController {
    output: watch::Receiver<Published>,
    state: watch::Receiver<ControllerState>,
    driver: JoinHandle<()>,
}

impl ListController {
    /// Start the driver task on the current runtime.
    pub fn spawn(
        playlists: watch::Receiver<Snapshot<Playlist>>,
        expansion: watch::Receiver<ExpansionMap>,
        sounds: watch::Receiver<Snapshot<Sound>>,
        resolver: Arc<dyn SoundResolver>,
        mode: MaterializeMode,
    ) -> Self {
        let (output_tx, output) = watch::channel(Published::default());
        let (state_tx, state) = watch::channel(ControllerState::Idle);

        let driver = Driver {
            playlists,
            expansion,
            sounds,
            resolver,
            mode,
            output: output_tx,
            state: state_tx,
            generation: 0,
            tasks: JoinSet::new(),
        };
        let driver = tokio::spawn(driver.run());

        Self {
            output,
            state,
            driver,
        }
    }

    /// Latest published rows.
    pub fn current(&self) -> Published {
        self.output.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Published> {
        self.output.clone()
    }

    pub fn state(&self) -> ControllerState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ControllerState> {
        self.state.clone()
    }
}

impl Drop for ListController {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

struct Driver {
    playlists: watch::Receiver<Snapshot<Playlist>>,
    expansion: watch::Receiver<ExpansionMap>,
    sounds: watch::Receiver<Snapshot<Sound>>,
    resolver: Arc<dyn SoundResolver>,
    mode: MaterializeMode,
    output: watch::Sender<Published>,
    state: watch::Sender<ControllerState>,
    generation: u64,
    tasks: JoinSet<()>,
}

impl Driver {
    async fn run(mut self) {
        let (tx, mut results) = mpsc::unbounded_channel::<Outcome>();

        self.trigger(&tx, "initial");

        loop {
            tokio::select! {
                changed = self.playlists.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.trigger(&tx, "playlists");
                }
                changed = self.expansion.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.trigger(&tx, "expansion");
                }
                changed = self.sounds.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.trigger(&tx, "sounds");
                }
                Some((generation, result)) = results.recv() => {
                    self.complete(generation, result);
                }
                Some(joined) = self.tasks.join_next() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            warn!(mode = ?self.mode, "recomputation task panicked");
                        }
                    }
                }
            }
        }

        debug!(mode = ?self.mode, "list controller source closed, stopping");
    }

    /// Start a recomputation against the latest value of every source.
    fn trigger(&mut self, tx: &mpsc::UnboundedSender<Outcome>, cause: &'static str) {
        self.generation += 1;
        let generation = self.generation;
        self.state
            .send_replace(ControllerState::Recomputing { generation });

        let playlists = self.playlists.borrow_and_update().clone();
        let expansion = self.expansion.borrow_and_update().clone();
        self.sounds.borrow_and_update();

        debug!(generation, cause, mode = ?self.mode, "recomputing rows");

        let resolver = Arc::clone(&self.resolver);
        let mode = self.mode;
        let reporter = Reporter {
            generation,
            tx: Some(tx.clone()),
        };
        self.tasks.spawn(async move {
            let result = materialize(&playlists, &expansion, resolver.as_ref(), mode).await;
            reporter.send(result);
        });
    }

    fn complete(&mut self, generation: u64, result: Result<Vec<DisplayRow>, StoreError>) {
        if generation != self.generation {
            debug!(
                generation,
                latest = self.generation,
                "discarding superseded rows"
            );
            return;
        }

        match result {
            Ok(rows) => {
                debug!(generation, rows = rows.len(), "publishing rows");
                self.output.send_replace(Published {
                    generation,
                    rows: Arc::new(rows),
                });
            }
            Err(e) => {
                warn!(generation, error = %e, "recomputation failed, keeping previous rows");
            }
        }
        self.state.send_replace(ControllerState::Idle);
    }
}

/// Delivers exactly one outcome per recomputation. If the task unwinds before
/// sending, the driver still hears about it as a failure.
struct Reporter {
    generation: u64,
    tx: Option<mpsc::UnboundedSender<Outcome>>,
}

impl Reporter {
    fn send(mut self, result: Result<Vec<DisplayRow>, StoreError>) {
        if let Some(tx) = self.tx.take() {
            // The driver may already be gone.
            let _ = tx.send((self.generation, result));
        }
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let err = StoreError::Task("recomputation ended without a result".to_string());
            let _ = tx.send((self.generation, Err(err)));
        }
    }
}

mod conflict;
mod error;
mod mutations;
mod queries;
mod session;
mod store;

pub use conflict::{find_conflict, has_conflict};
pub use error::EngineError;
pub use store::InMemoryStore;

use std::time::Instant;

use tracing::{info, warn};

use crate::auth::Session;
use crate::model::Event;
use crate::observability;
use crate::persistence::Persistence;
use crate::seed;

/// Default number of appends after which the history is compacted.
pub const DEFAULT_COMPACT_THRESHOLD: u64 = 1000;

/// Owns the collections, the persistence collaborator, and the login session.
///
/// All operations take `&mut self` or `&self`: one writer, no interleaving
/// between a conflict check and the write it guards.
pub struct Engine<P: Persistence> {
    store: InMemoryStore,
    persistence: P,
    session: Option<Session>,
    compact_threshold: u64,
}

impl<P: Persistence> Engine<P> {
    /// Rebuild state from `persistence`. When nothing was ever stored this is a
    /// first start and gets the default statuses, rooms, and users. A stored
    /// empty state stays empty.
    pub fn open(mut persistence: P) -> Result<Self, EngineError> {
        let stored = persistence.load()?;
        let mut engine = Self {
            store: InMemoryStore::new(),
            persistence,
            session: None,
            compact_threshold: DEFAULT_COMPACT_THRESHOLD,
        };

        match stored {
            Some(events) => {
                engine.store = InMemoryStore::from_events(&events);
                info!(
                    "loaded {} rooms, {} statuses, {} users, {} bookings from {} events",
                    engine.store.rooms.len(),
                    engine.store.statuses.len(),
                    engine.store.users.len(),
                    engine.store.bookings.len(),
                    events.len()
                );
            }
            None => {
                info!("no stored data, seeding defaults");
                for event in seed::default_events() {
                    engine.persist_and_apply(&event)?;
                }
            }
        }
        Ok(engine)
    }

    /// Give back the persistence collaborator, e.g. to reopen it.
    pub fn into_persistence(self) -> P {
        self.persistence
    }

    pub fn with_compact_threshold(mut self, threshold: u64) -> Self {
        self.compact_threshold = threshold;
        self
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Persist, then apply. A persistence failure leaves the collections untouched.
    fn persist_and_apply(&mut self, event: &Event) -> Result<(), EngineError> {
        let started = Instant::now();
        self.persistence.append(event)?;
        metrics::histogram!(observability::PERSIST_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        self.store.apply_event(event);
        let (entity, op) = event.labels();
        metrics::counter!(observability::MUTATIONS_TOTAL, "entity" => entity, "op" => op).increment(1);

        if self.compact_threshold > 0 && self.persistence.appends_since_compact() >= self.compact_threshold {
            // The mutation already landed; a failed compaction only leaves a longer history.
            if let Err(e) = self.compact() {
                warn!("automatic compaction failed: {e}");
            }
        }
        Ok(())
    }

    /// Rewrite the stored history as the minimal event set for the current state.
    pub fn compact(&mut self) -> Result<(), EngineError> {
        let events = self.store.to_events();
        self.persistence.compact(&events)?;
        info!("compacted history to {} events", events.len());
        Ok(())
    }
}

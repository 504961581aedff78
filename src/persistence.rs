use std::io;
use std::path::Path;

use tracing::info;

use crate::model::Event;
use crate::wal::Wal;

#[derive(Debug)]
pub enum PersistError {
    Io(io::Error),
    /// Stored data exists but cannot be decoded.
    Format(String),
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::Io(e) => write!(f, "I/O error: {e}"),
            PersistError::Format(e) => write!(f, "unreadable stored data: {e}"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io(e) => Some(e),
            PersistError::Format(_) => None,
        }
    }
}

impl From<io::Error> for PersistError {
    fn from(error: io::Error) -> Self {
        PersistError::Io(error)
    }
}

/// Where the engine's mutations go.
///
/// The engine calls `append` before applying an event; if it fails the
/// in-memory state is left untouched.
pub trait Persistence {
    /// Events that rebuild the stored state, oldest first.
    ///
    /// `None` when nothing was ever stored (first start). `Some` with no
    /// events is a stored, empty state and must not be treated as a first start.
    fn load(&mut self) -> Result<Option<Vec<Event>>, PersistError>;

    fn append(&mut self, event: &Event) -> Result<(), PersistError>;

    /// Replace the stored history with `events`, which recreate the current state.
    fn compact(&mut self, events: &[Event]) -> Result<(), PersistError>;

    /// Appends since the last compaction. Backends that never grow return 0.
    fn appends_since_compact(&self) -> u64 {
        0
    }
}

impl<P: Persistence + ?Sized> Persistence for Box<P> {
    fn load(&mut self) -> Result<Option<Vec<Event>>, PersistError> {
        (**self).load()
    }

    fn append(&mut self, event: &Event) -> Result<(), PersistError> {
        (**self).append(event)
    }

    fn compact(&mut self, events: &[Event]) -> Result<(), PersistError> {
        (**self).compact(events)
    }

    fn appends_since_compact(&self) -> u64 {
        (**self).appends_since_compact()
    }
}

/// Keeps the event history in memory only.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    pub events: Vec<Event>,
    stored: bool,
    appended: u64,
}

impl MemoryPersistence {
    /// Nothing stored yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A previously stored history, possibly empty.
    pub fn with_events(events: Vec<Event>) -> Self {
        Self { events, stored: true, appended: 0 }
    }
}

impl Persistence for MemoryPersistence {
    fn load(&mut self) -> Result<Option<Vec<Event>>, PersistError> {
        Ok(self.stored.then(|| self.events.clone()))
    }

    fn append(&mut self, event: &Event) -> Result<(), PersistError> {
        self.events.push(event.clone());
        self.stored = true;
        self.appended += 1;
        Ok(())
    }

    fn compact(&mut self, events: &[Event]) -> Result<(), PersistError> {
        self.events = events.to_vec();
        self.stored = true;
        self.appended = 0;
        Ok(())
    }

    fn appends_since_compact(&self) -> u64 {
        self.appended
    }
}

/// Append-only log on disk, see [`Wal`].
pub struct WalPersistence {
    wal: Wal,
}

impl WalPersistence {
    pub fn open(path: &Path) -> Result<Self, PersistError> {
        let wal = Wal::open(path)?;
        info!("opened WAL at {}", path.display());
        Ok(Self { wal })
    }
}

impl Persistence for WalPersistence {
    fn load(&mut self) -> Result<Option<Vec<Event>>, PersistError> {
        Ok(Wal::replay(self.wal.path())?)
    }

    fn append(&mut self, event: &Event) -> Result<(), PersistError> {
        Ok(self.wal.append(event)?)
    }

    fn compact(&mut self, events: &[Event]) -> Result<(), PersistError> {
        Ok(self.wal.compact(events)?)
    }

    fn appends_since_compact(&self) -> u64 {
        self.wal.appends_since_compact()
    }
}

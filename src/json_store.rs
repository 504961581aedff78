use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::engine::InMemoryStore;
use crate::model::Event;
use crate::persistence::{PersistError, Persistence};

/// Whole-document JSON storage: `rooms`, `statuses`, `bookings`, `users` as
/// camelCase records with ISO-8601 dates.
///
/// Keeps a mirror of the collections and rewrites the document after every
/// event (temp file + rename), the way a browser store saves the full array
/// on each change.
pub struct JsonPersistence {
    path: PathBuf,
    mirror: InMemoryStore,
}

impl JsonPersistence {
    pub fn open(path: &Path) -> Self {
        info!("using JSON store at {}", path.display());
        Self {
            path: path.to_path_buf(),
            mirror: InMemoryStore::new(),
        }
    }

    fn write_document(&self, store: &InMemoryStore) -> Result<(), PersistError> {
        let tmp_path = self.path.with_extension("json.tmp");
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, store).map_err(|e| PersistError::Format(e.to_string()))?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl Persistence for JsonPersistence {
    /// A missing file is a first start; an existing document, even with empty
    /// collections, is stored state.
    fn load(&mut self) -> Result<Option<Vec<Event>>, PersistError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        self.mirror = serde_json::from_str(&text).map_err(|e| PersistError::Format(e.to_string()))?;
        Ok(Some(self.mirror.to_events()))
    }

    fn append(&mut self, event: &Event) -> Result<(), PersistError> {
        let mut next = self.mirror.clone();
        next.apply_event(event);
        self.write_document(&next)?;
        self.mirror = next;
        Ok(())
    }

    fn compact(&mut self, events: &[Event]) -> Result<(), PersistError> {
        let store = InMemoryStore::from_events(events);
        self.write_document(&store)?;
        self.mirror = store;
        Ok(())
    }
}

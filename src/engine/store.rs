use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::model::*;

/// The four collections, in insertion order.
///
/// Serialized as-is this is the storage document: `rooms`, `statuses`, `bookings`, `users`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryStore {
    pub rooms: Vec<Room>,
    pub statuses: Vec<RoomStatus>,
    pub bookings: Vec<Booking>,
    pub users: Vec<User>,
}

/// Replace the record with a matching id, or append it.
fn upsert<T>(items: &mut Vec<T>, item: T, id_of: impl Fn(&T) -> Ulid) {
    let id = id_of(&item);
    match items.iter_mut().find(|existing| id_of(existing) == id) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

fn remove<T>(items: &mut Vec<T>, id: Ulid, id_of: impl Fn(&T) -> Ulid) {
    items.retain(|item| id_of(item) != id);
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Lookups ──────────────────────────────────────────────

    pub fn room(&self, id: &Ulid) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == *id)
    }

    pub fn status(&self, id: &Ulid) -> Option<&RoomStatus> {
        self.statuses.iter().find(|s| s.id == *id)
    }

    pub fn user(&self, id: &Ulid) -> Option<&User> {
        self.users.iter().find(|u| u.id == *id)
    }

    pub fn booking(&self, id: &Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == *id)
    }

    // ── Event application ────────────────────────────────────

    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::StatusCreated(status) | Event::StatusUpdated(status) => {
                upsert(&mut self.statuses, status.clone(), |s| s.id);
            }
            Event::StatusDeleted { id } => remove(&mut self.statuses, *id, |s| s.id),
            Event::RoomCreated(room) | Event::RoomUpdated(room) => {
                upsert(&mut self.rooms, room.clone(), |r| r.id);
            }
            Event::RoomDeleted { id } => remove(&mut self.rooms, *id, |r| r.id),
            Event::UserCreated(user) | Event::UserUpdated(user) => {
                upsert(&mut self.users, user.clone(), |u| u.id);
            }
            Event::UserDeleted { id } => remove(&mut self.users, *id, |u| u.id),
            Event::BookingCreated(booking) | Event::BookingUpdated(booking) => {
                upsert(&mut self.bookings, booking.clone(), |b| b.id);
            }
            Event::BookingDeleted { id } => remove(&mut self.bookings, *id, |b| b.id),
        }
    }

    /// Minimal event sequence that recreates this store, preserving collection order.
    pub fn to_events(&self) -> Vec<Event> {
        let mut events =
            Vec::with_capacity(self.statuses.len() + self.rooms.len() + self.users.len() + self.bookings.len());
        events.extend(self.statuses.iter().cloned().map(Event::StatusCreated));
        events.extend(self.rooms.iter().cloned().map(Event::RoomCreated));
        events.extend(self.users.iter().cloned().map(Event::UserCreated));
        events.extend(self.bookings.iter().cloned().map(Event::BookingCreated));
        events
    }

    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        let mut store = Self::new();
        for event in events {
            store.apply_event(event);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(name: &str) -> RoomStatus {
        RoomStatus { id: Ulid::new(), name: name.into() }
    }

    #[test]
    fn update_replaces_in_place() {
        let mut store = InMemoryStore::new();
        let a = status("Ativo");
        let b = status("Inativo");
        store.apply_event(&Event::StatusCreated(a.clone()));
        store.apply_event(&Event::StatusCreated(b.clone()));

        let renamed = RoomStatus { id: a.id, name: "Disponível".into() };
        store.apply_event(&Event::StatusUpdated(renamed.clone()));

        assert_eq!(store.statuses, vec![renamed, b]);
    }

    #[test]
    fn delete_missing_is_noop() {
        let mut store = InMemoryStore::new();
        store.apply_event(&Event::StatusCreated(status("Ativo")));
        store.apply_event(&Event::StatusDeleted { id: Ulid::new() });
        assert_eq!(store.statuses.len(), 1);
    }

    #[test]
    fn events_roundtrip_preserves_order() {
        let mut store = InMemoryStore::new();
        for name in ["c", "a", "b"] {
            store.apply_event(&Event::StatusCreated(status(name)));
        }
        store.apply_event(&Event::RoomCreated(Room {
            id: Ulid::new(),
            name: "Sala".into(),
            status_id: store.statuses[0].id,
            capacity: 3,
            description: None,
        }));

        let rebuilt = InMemoryStore::from_events(&store.to_events());
        assert_eq!(rebuilt, store);
        let names: Vec<_> = rebuilt.statuses.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }
}

use chrono::Utc;
use tracing::{debug, info};
use ulid::Ulid;

use crate::model::*;
use crate::observability;
use crate::persistence::Persistence;

use super::conflict::find_conflict;
use super::{Engine, EngineError};

impl<P: Persistence> Engine<P> {
    // ── Statuses ─────────────────────────────────────────────

    pub fn create_status(&mut self, draft: NewStatus) -> Result<RoomStatus, EngineError> {
        let status = draft.into_status(Ulid::new());
        self.persist_and_apply(&Event::StatusCreated(status.clone()))?;
        Ok(status)
    }

    pub fn update_status(&mut self, id: Ulid, draft: NewStatus) -> Result<RoomStatus, EngineError> {
        if self.store.status(&id).is_none() {
            return Err(EngineError::NotFound(id));
        }
        let status = draft.into_status(id);
        self.persist_and_apply(&Event::StatusUpdated(status.clone()))?;
        Ok(status)
    }

    /// Rooms keep pointing at a deleted status; lookups render it as `-`.
    pub fn delete_status(&mut self, id: Ulid) -> Result<bool, EngineError> {
        let exists = self.store.status(&id).is_some();
        self.delete_if(exists, Event::StatusDeleted { id })
    }

    // ── Rooms ────────────────────────────────────────────────

    pub fn create_room(&mut self, draft: NewRoom) -> Result<Room, EngineError> {
        let room = Room::from_draft(Ulid::new(), draft);
        self.persist_and_apply(&Event::RoomCreated(room.clone()))?;
        Ok(room)
    }

    pub fn update_room(&mut self, id: Ulid, draft: NewRoom) -> Result<Room, EngineError> {
        if self.store.room(&id).is_none() {
            return Err(EngineError::NotFound(id));
        }
        let room = Room::from_draft(id, draft);
        self.persist_and_apply(&Event::RoomUpdated(room.clone()))?;
        Ok(room)
    }

    /// Bookings on the room are kept.
    pub fn delete_room(&mut self, id: Ulid) -> Result<bool, EngineError> {
        let exists = self.store.room(&id).is_some();
        self.delete_if(exists, Event::RoomDeleted { id })
    }

    // ── Users ────────────────────────────────────────────────

    pub fn create_user(&mut self, draft: NewUser) -> Result<User, EngineError> {
        let user = User::from_draft(Ulid::new(), draft, Utc::now());
        self.persist_and_apply(&Event::UserCreated(user.clone()))?;
        Ok(user)
    }

    /// `created_at` survives the update.
    pub fn update_user(&mut self, id: Ulid, draft: NewUser) -> Result<User, EngineError> {
        let created_at = self
            .store
            .user(&id)
            .map(|u| u.created_at)
            .ok_or(EngineError::NotFound(id))?;
        let user = User::from_draft(id, draft, created_at);
        self.persist_and_apply(&Event::UserUpdated(user.clone()))?;
        Ok(user)
    }

    /// Bookings owned by the user are kept. Deleting the logged-in user ends the session.
    pub fn delete_user(&mut self, id: Ulid) -> Result<bool, EngineError> {
        let exists = self.store.user(&id).is_some();
        let removed = self.delete_if(exists, Event::UserDeleted { id })?;
        if removed && self.session.as_ref().is_some_and(|s| s.user_id == id) {
            info!("logged-in user {id} was deleted, ending session");
            self.session = None;
        }
        Ok(removed)
    }

    // ── Bookings ─────────────────────────────────────────────

    /// Create a booking unless it overlaps another booking on the same room.
    /// On `Err(Conflict)` nothing was written.
    pub fn create_booking(&mut self, draft: NewBooking) -> Result<Booking, EngineError> {
        self.check_gate(draft.room_id(), &draft.span(), None)?;
        let booking = Booking::from_draft(Ulid::new(), draft);
        self.persist_and_apply(&Event::BookingCreated(booking.clone()))?;
        Ok(booking)
    }

    /// Replace booking `id`. The booking's own current interval never counts as a conflict.
    pub fn update_booking(&mut self, id: Ulid, draft: NewBooking) -> Result<Booking, EngineError> {
        if self.store.booking(&id).is_none() {
            return Err(EngineError::NotFound(id));
        }
        self.check_gate(draft.room_id(), &draft.span(), Some(id))?;
        let booking = Booking::from_draft(id, draft);
        self.persist_and_apply(&Event::BookingUpdated(booking.clone()))?;
        Ok(booking)
    }

    pub fn delete_booking(&mut self, id: Ulid) -> Result<bool, EngineError> {
        let exists = self.store.booking(&id).is_some();
        self.delete_if(exists, Event::BookingDeleted { id })
    }

    fn check_gate(&self, room_id: Ulid, span: &Span, exclude: Option<Ulid>) -> Result<(), EngineError> {
        if let Some(existing) = find_conflict(&self.store.bookings, room_id, span, exclude) {
            debug!("booking on room {room_id} rejected, overlaps {existing}");
            metrics::counter!(observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            return Err(EngineError::Conflict(existing));
        }
        Ok(())
    }

    fn delete_if(&mut self, exists: bool, event: Event) -> Result<bool, EngineError> {
        if !exists {
            return Ok(false);
        }
        self.persist_and_apply(&event)?;
        Ok(true)
    }
}

use chrono::{DateTime, Utc};
use ulid::Ulid;

use crate::achievements::{self, Achievement};
use crate::model::*;
use crate::persistence::Persistence;
use crate::seed::ACTIVE_STATUS_NAME;
use crate::stats::{compute_admin_stats, compute_user_stats, AdminStats, UserStats};

use super::conflict::has_conflict;
use super::Engine;

/// Shown in place of a name when a reference points at a deleted record.
pub const MISSING_LABEL: &str = "-";

impl<P: Persistence> Engine<P> {
    pub fn rooms(&self) -> &[Room] {
        &self.store.rooms
    }

    pub fn statuses(&self) -> &[RoomStatus] {
        &self.store.statuses
    }

    pub fn users(&self) -> &[User] {
        &self.store.users
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.store.bookings
    }

    pub fn get_room(&self, id: &Ulid) -> Option<&Room> {
        self.store.room(id)
    }

    pub fn get_status(&self, id: &Ulid) -> Option<&RoomStatus> {
        self.store.status(id)
    }

    pub fn get_user(&self, id: &Ulid) -> Option<&User> {
        self.store.user(id)
    }

    pub fn get_booking(&self, id: &Ulid) -> Option<&Booking> {
        self.store.booking(id)
    }

    pub fn room_label(&self, id: &Ulid) -> &str {
        self.get_room(id).map_or(MISSING_LABEL, |r| r.name.as_str())
    }

    pub fn status_label(&self, id: &Ulid) -> &str {
        self.get_status(id).map_or(MISSING_LABEL, |s| s.name.as_str())
    }

    pub fn user_label(&self, id: &Ulid) -> &str {
        self.get_user(id).map_or(MISSING_LABEL, |u| u.name.as_str())
    }

    /// Pre-validation for a form: would `[start, end)` on `room_id` collide
    /// with an existing booking other than `exclude`?
    ///
    /// Ordering of `start` and `end` is not checked here; the overlap test is
    /// applied to the bounds as given.
    pub fn check_booking_conflict(
        &self,
        room_id: Ulid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Ulid>,
    ) -> bool {
        has_conflict(&self.store.bookings, room_id, &Span::from_instants(start, end), exclude)
    }

    /// Rooms offered for new bookings: those whose status is the active one.
    pub fn active_rooms(&self) -> Vec<&Room> {
        let active: Vec<Ulid> = self
            .store
            .statuses
            .iter()
            .filter(|s| s.name == ACTIVE_STATUS_NAME)
            .map(|s| s.id)
            .collect();
        self.store.rooms.iter().filter(|r| active.contains(&r.status_id)).collect()
    }

    /// Admins see every booking; everyone else only their own.
    pub fn visible_bookings(&self, viewer: &User) -> Vec<&Booking> {
        self.store
            .bookings
            .iter()
            .filter(|b| viewer.is_admin() || b.user_id == viewer.id)
            .collect()
    }

    /// Most recent visible bookings by start time, newest first.
    pub fn recent_bookings(&self, viewer: &User, limit: usize) -> Vec<&Booking> {
        let mut bookings = self.visible_bookings(viewer);
        bookings.sort_by(|a, b| b.start_date_time.cmp(&a.start_date_time));
        bookings.truncate(limit);
        bookings
    }

    pub fn user_stats(&self, user_id: Ulid) -> UserStats {
        compute_user_stats(&self.store.bookings, &self.store.rooms, user_id)
    }

    pub fn admin_stats(&self) -> AdminStats {
        self.admin_stats_at(Utc::now())
    }

    pub fn admin_stats_at(&self, now: DateTime<Utc>) -> AdminStats {
        compute_admin_stats(&self.store.bookings, &self.store.rooms, &self.store.users, now)
    }

    pub fn achievements(&self, user_id: Ulid) -> Vec<Achievement> {
        achievements::evaluate(&self.user_stats(user_id))
    }
}

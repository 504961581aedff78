//! Derived views over the booking collection. Pure functions, recomputed on
//! every read.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

use crate::limits::*;
use crate::model::{round_tenth, Booking, Room, User};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub total_bookings: usize,
    /// Rounded to one decimal.
    pub total_hours: f64,
    pub first_booking_date: Option<DateTime<Utc>>,
    pub last_booking_date: Option<DateTime<Utc>>,
    pub longest_meeting_hours: f64,
    pub favorite_room: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomUsage {
    pub room_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminStats {
    pub total_rooms: usize,
    pub total_users: usize,
    pub total_bookings: usize,
    /// Percent of the bookable month, rounded to an integer. Can exceed 100.
    pub utilization_rate: u64,
    pub completed_events: usize,
    /// Descending by count; ties keep first-encounter order.
    pub most_used_rooms: Vec<RoomUsage>,
}

impl AdminStats {
    /// The ranking as shown: the first `n` rooms of `most_used_rooms`.
    pub fn top_rooms(&self, n: usize) -> &[RoomUsage] {
        &self.most_used_rooms[..n.min(self.most_used_rooms.len())]
    }
}

/// Booking counts per room, in the order each room is first seen.
fn counts_by_room<'a>(bookings: impl Iterator<Item = &'a Booking>) -> Vec<(Ulid, usize)> {
    let mut counts: Vec<(Ulid, usize)> = Vec::new();
    for booking in bookings {
        match counts.iter_mut().find(|(id, _)| *id == booking.room_id) {
            Some((_, n)) => *n += 1,
            None => counts.push((booking.room_id, 1)),
        }
    }
    counts
}

fn room_name(rooms: &[Room], id: Ulid) -> Option<&str> {
    rooms.iter().find(|r| r.id == id).map(|r| r.name.as_str())
}

pub fn compute_user_stats(bookings: &[Booking], rooms: &[Room], user_id: Ulid) -> UserStats {
    let own: Vec<&Booking> = bookings.iter().filter(|b| b.user_id == user_id).collect();

    let total_hours: f64 = own.iter().map(|b| b.duration_hours).sum();
    let longest = own.iter().map(|b| b.duration_hours).fold(0.0, f64::max);

    // Strictly greater keeps the first-encountered room on ties.
    let mut favorite: Option<(Ulid, usize)> = None;
    for (room_id, count) in counts_by_room(own.iter().copied()) {
        if favorite.is_none_or(|(_, best)| count > best) {
            favorite = Some((room_id, count));
        }
    }

    UserStats {
        total_bookings: own.len(),
        total_hours: round_tenth(total_hours),
        first_booking_date: own.iter().map(|b| b.start_date_time).min(),
        last_booking_date: own.iter().map(|b| b.start_date_time).max(),
        longest_meeting_hours: longest,
        favorite_room: favorite.and_then(|(id, _)| room_name(rooms, id)).map(str::to_string),
    }
}

pub fn compute_admin_stats(bookings: &[Booking], rooms: &[Room], users: &[User], now: DateTime<Utc>) -> AdminStats {
    // Rows are per room name: rooms sharing a name share a row.
    let mut most_used_rooms: Vec<RoomUsage> = Vec::new();
    for (id, count) in counts_by_room(bookings.iter()) {
        let Some(name) = room_name(rooms, id) else { continue };
        match most_used_rooms.iter_mut().find(|usage| usage.room_name == name) {
            Some(usage) => usage.count += count,
            None => most_used_rooms.push(RoomUsage { room_name: name.to_string(), count }),
        }
    }
    // sort_by is stable
    most_used_rooms.sort_by(|a, b| b.count.cmp(&a.count));

    let completed_events = bookings.iter().filter(|b| b.end_date_time < now).count();

    let total_booked_hours: f64 = bookings.iter().map(|b| b.duration_hours).sum();
    let possible_hours = rooms.len() as f64 * BUSINESS_HOURS_PER_DAY * BUSINESS_DAYS_PER_MONTH;
    let utilization_rate = if possible_hours > 0.0 {
        (total_booked_hours / possible_hours * 100.0).round() as u64
    } else {
        0
    };

    AdminStats {
        total_rooms: rooms.len(),
        total_users: users.len(),
        total_bookings: bookings.len(),
        utilization_rate,
        completed_events,
        most_used_rooms,
    }
}

use ulid::Ulid;

use crate::model::{Booking, Span};

/// First booking on `room_id` whose interval overlaps `span`, skipping `exclude`.
///
/// Intervals are half-open, so a booking ending exactly at `span.start` is not a conflict.
/// `exclude` lets an edited booking be checked without colliding with itself.
pub fn find_conflict(
    bookings: &[Booking],
    room_id: Ulid,
    span: &Span,
    exclude: Option<Ulid>,
) -> Option<Ulid> {
    bookings
        .iter()
        .filter(|b| b.room_id == room_id)
        .filter(|b| Some(b.id) != exclude)
        .find(|b| b.span().overlaps(span))
        .map(|b| b.id)
}

pub fn has_conflict(bookings: &[Booking], room_id: Ulid, span: &Span, exclude: Option<Ulid>) -> bool {
    find_conflict(bookings, room_id, span, exclude).is_some()
}

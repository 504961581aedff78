use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::limits::*;

/// Unix milliseconds. Interval math runs on these; records keep `DateTime<Utc>`.
pub type Ms = i64;

pub const HOUR_MS: Ms = 3_600_000;

/// Half-open interval `[start, end)`.
///
/// Ordering is validated by the draft constructors, not here: stored data may
/// carry bounds in any order and must still be comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        Self { start, end }
    }

    pub fn from_instants(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(start.timestamp_millis(), end.timestamp_millis())
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// Length in hours, rounded to one decimal.
    pub fn duration_hours(&self) -> f64 {
        round_tenth(self.duration_ms() as f64 / HOUR_MS as f64)
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

pub(crate) fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ── Records ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Ulid,
    pub description: String,
    pub room_id: Ulid,
    pub user_id: Ulid,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    /// Always derived from the interval; see [`Span::duration_hours`].
    pub duration_hours: f64,
}

impl Booking {
    pub fn from_draft(id: Ulid, draft: NewBooking) -> Self {
        let duration_hours = draft.span().duration_hours();
        Self {
            id,
            description: draft.description,
            room_id: draft.room_id,
            user_id: draft.user_id,
            start_date_time: draft.start,
            end_date_time: draft.end,
            duration_hours,
        }
    }

    pub fn span(&self) -> Span {
        Span::from_instants(self.start_date_time, self.end_date_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Ulid,
    pub name: String,
    pub status_id: Ulid,
    pub capacity: u32,
    pub description: Option<String>,
}

impl Room {
    pub fn from_draft(id: Ulid, draft: NewRoom) -> Self {
        Self {
            id,
            name: draft.name,
            status_id: draft.status_id,
            capacity: draft.capacity,
            description: draft.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStatus {
    pub id: Ulid,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "user")]
    Standard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Ulid,
    pub name: String,
    pub login: String,
    pub password: String,
    #[serde(rename = "type")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn from_draft(id: Ulid, draft: NewUser, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            login: draft.login,
            password: draft.password,
            role: draft.role,
            created_at,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// ── Drafts (validated input) ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Required(&'static str),
    TooLong(&'static str),
    EndNotAfterStart,
    ZeroCapacity,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Required(field) => write!(f, "{field} is required"),
            ValidationError::TooLong(field) => write!(f, "{field} is too long"),
            ValidationError::EndNotAfterStart => write!(f, "end must be after start"),
            ValidationError::ZeroCapacity => write!(f, "capacity must be a positive number"),
        }
    }
}

impl std::error::Error for ValidationError {}

fn required_text(value: &str, field: &'static str, max_len: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    if trimmed.len() > max_len {
        return Err(ValidationError::TooLong(field));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    description: String,
    room_id: Ulid,
    user_id: Ulid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl NewBooking {
    pub fn new(
        description: &str,
        room_id: Ulid,
        user_id: Ulid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let description = required_text(description, "description", MAX_DESCRIPTION_LEN)?;
        if end <= start {
            return Err(ValidationError::EndNotAfterStart);
        }
        Ok(Self { description, room_id, user_id, start, end })
    }

    pub fn room_id(&self) -> Ulid {
        self.room_id
    }

    pub fn user_id(&self) -> Ulid {
        self.user_id
    }

    pub fn span(&self) -> Span {
        Span::from_instants(self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    name: String,
    status_id: Ulid,
    capacity: u32,
    description: Option<String>,
}

impl NewRoom {
    pub fn new(
        name: &str,
        status_id: Ulid,
        capacity: u32,
        description: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let name = required_text(name, "name", MAX_NAME_LEN)?;
        if capacity == 0 {
            return Err(ValidationError::ZeroCapacity);
        }
        let description = match description.map(str::trim) {
            Some(d) if d.len() > MAX_DESCRIPTION_LEN => {
                return Err(ValidationError::TooLong("description"));
            }
            Some(d) if !d.is_empty() => Some(d.to_string()),
            _ => None,
        };
        Ok(Self { name, status_id, capacity, description })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStatus {
    name: String,
}

impl NewStatus {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Ok(Self { name: required_text(name, "name", MAX_NAME_LEN)? })
    }

    pub fn into_status(self, id: Ulid) -> RoomStatus {
        RoomStatus { id, name: self.name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    name: String,
    login: String,
    password: String,
    role: Role,
}

impl NewUser {
    pub fn new(name: &str, login: &str, password: &str, role: Role) -> Result<Self, ValidationError> {
        let name = required_text(name, "name", MAX_NAME_LEN)?;
        let login = required_text(login, "login", MAX_NAME_LEN)?;
        // Passwords are compared verbatim, so no trimming.
        if password.is_empty() {
            return Err(ValidationError::Required("password"));
        }
        if password.len() > MAX_NAME_LEN {
            return Err(ValidationError::TooLong("password"));
        }
        Ok(Self { name, login, password: password.to_string(), role })
    }
}

/// The event types. Every mutation is recorded as one of these before it is applied.
/// Created/Updated carry the whole record and apply as upserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    StatusCreated(RoomStatus),
    StatusUpdated(RoomStatus),
    StatusDeleted { id: Ulid },
    RoomCreated(Room),
    RoomUpdated(Room),
    RoomDeleted { id: Ulid },
    UserCreated(User),
    UserUpdated(User),
    UserDeleted { id: Ulid },
    BookingCreated(Booking),
    BookingUpdated(Booking),
    BookingDeleted { id: Ulid },
}

impl Event {
    /// `(entity, op)` labels for metrics and logs.
    pub fn labels(&self) -> (&'static str, &'static str) {
        match self {
            Event::StatusCreated(_) => ("status", "create"),
            Event::StatusUpdated(_) => ("status", "update"),
            Event::StatusDeleted { .. } => ("status", "delete"),
            Event::RoomCreated(_) => ("room", "create"),
            Event::RoomUpdated(_) => ("room", "update"),
            Event::RoomDeleted { .. } => ("room", "delete"),
            Event::UserCreated(_) => ("user", "create"),
            Event::UserUpdated(_) => ("user", "update"),
            Event::UserDeleted { .. } => ("user", "delete"),
            Event::BookingCreated(_) => ("booking", "create"),
            Event::BookingUpdated(_) => ("booking", "update"),
            Event::BookingDeleted { .. } => ("booking", "delete"),
        }
    }
}

//! Command-line front end: parses arguments, logs in, and drives the [`Engine`].

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use ulid::Ulid;

use crate::config::{Config, StorageKind};
use crate::engine::{Engine, EngineError};
use crate::limits::{RANKING_SIZE, RECENT_ACTIVITY_SIZE};
use crate::model::*;
use crate::persistence::{PersistError, Persistence};

#[derive(Debug, Parser)]
#[clap(name = "roombook", version, about = "Meeting room booking administration")]
pub struct CliArgs {
    #[clap(flatten)]
    pub global_opts: GlobalOpts,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Directory holding the stored data (overrides ROOMBOOK_DATA_DIR)
    #[clap(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Storage backend (overrides ROOMBOOK_STORAGE)
    #[clap(long, global = true, value_enum)]
    pub storage: Option<StorageKind>,

    /// Verbosity level (can be specified multiple times)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Args)]
pub struct Credentials {
    #[clap(long)]
    pub login: String,
    #[clap(long)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct BookingArgs {
    /// Room id
    #[clap(long)]
    pub room: Ulid,
    /// Start, RFC 3339 (e.g. 2024-05-02T09:00:00Z)
    #[clap(long)]
    pub start: DateTime<Utc>,
    /// End, RFC 3339
    #[clap(long)]
    pub end: DateTime<Utc>,
    #[clap(long)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Collection {
    Rooms,
    Statuses,
    Users,
    Bookings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Room,
    Status,
    User,
    Booking,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a collection
    List {
        #[clap(value_enum)]
        collection: Collection,
        #[clap(flatten)]
        auth: Credentials,
    },
    /// Add a room status (admin)
    AddStatus {
        name: String,
        #[clap(flatten)]
        auth: Credentials,
    },
    /// Add a room (admin)
    AddRoom {
        #[clap(long)]
        name: String,
        /// Status id
        #[clap(long)]
        status: Ulid,
        #[clap(long)]
        capacity: u32,
        #[clap(long)]
        description: Option<String>,
        #[clap(flatten)]
        auth: Credentials,
    },
    /// Add a user (admin)
    AddUser {
        #[clap(long)]
        name: String,
        #[clap(long = "new-login")]
        new_login: String,
        #[clap(long = "new-password")]
        new_password: String,
        #[clap(long)]
        admin: bool,
        #[clap(flatten)]
        auth: Credentials,
    },
    /// Book a room for the logged-in user
    Book {
        #[clap(flatten)]
        booking: BookingArgs,
        #[clap(flatten)]
        auth: Credentials,
    },
    /// Change an existing booking
    Reschedule {
        id: Ulid,
        #[clap(flatten)]
        booking: BookingArgs,
        #[clap(flatten)]
        auth: Credentials,
    },
    /// Cancel a booking
    Cancel {
        id: Ulid,
        #[clap(flatten)]
        auth: Credentials,
    },
    /// Delete a room, status, or user (admin)
    Delete {
        #[clap(value_enum)]
        kind: EntityKind,
        id: Ulid,
        #[clap(flatten)]
        auth: Credentials,
    },
    /// Check whether an interval is free on a room
    Check {
        #[clap(long)]
        room: Ulid,
        #[clap(long)]
        start: DateTime<Utc>,
        #[clap(long)]
        end: DateTime<Utc>,
        /// Booking id to ignore (the one being edited)
        #[clap(long)]
        exclude: Option<Ulid>,
    },
    /// Dashboard: admin statistics, or the user's own stats and achievements
    Stats {
        #[clap(flatten)]
        auth: Credentials,
    },
    /// Rewrite stored history to the minimal event set (admin)
    Compact {
        #[clap(flatten)]
        auth: Credentials,
    },
}

#[derive(Debug)]
pub enum CliError {
    /// Storage could not be opened, read, or written
    Storage(PersistError),
    /// Input rejected before reaching the engine, or by a draft constructor
    InvalidInput(String),
    /// The requested interval overlaps an existing booking
    ScheduleConflict(Ulid),
    NotFound(Ulid),
    AuthenticationFailed,
    /// The logged-in user may not perform this command
    PermissionDenied,
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidInput(_) => 1,
            CliError::ScheduleConflict(_) => 2,
            CliError::NotFound(_) => 3,
            CliError::AuthenticationFailed => 4,
            CliError::PermissionDenied => 4,
            CliError::Storage(_) => 5,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Storage(e) => write!(f, "Storage error: {e}"),
            CliError::InvalidInput(e) => write!(f, "Invalid input: {e}"),
            CliError::ScheduleConflict(id) => write!(
                f,
                "Schedule conflict: the room is already booked in this period (booking {id})"
            ),
            CliError::NotFound(id) => write!(f, "Not found: {id}"),
            CliError::AuthenticationFailed => write!(f, "Invalid login or password"),
            CliError::PermissionDenied => write!(f, "Permission denied"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<EngineError> for CliError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::NotFound(id) => CliError::NotFound(id),
            EngineError::Conflict(id) => CliError::ScheduleConflict(id),
            EngineError::Invalid(e) => CliError::InvalidInput(e.to_string()),
            EngineError::Persistence(e) => CliError::Storage(e),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(error: ValidationError) -> Self {
        CliError::InvalidInput(error.to_string())
    }
}

impl From<PersistError> for CliError {
    fn from(error: PersistError) -> Self {
        CliError::Storage(error)
    }
}

/// Apply the global flags on top of the environment configuration.
pub fn effective_config(opts: &GlobalOpts, mut config: Config) -> Config {
    if let Some(dir) = &opts.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(storage) = opts.storage {
        config.storage = storage;
    }
    config
}

/// Open the configured store and run one command, writing its report to `out`.
pub fn run(command: Command, config: &Config, out: &mut impl std::io::Write) -> Result<(), CliError> {
    let persistence = config.open_persistence()?;
    let mut engine = Engine::open(persistence)?.with_compact_threshold(config.compact_threshold);
    execute(&mut engine, command, out)
}

fn login<P: Persistence>(engine: &mut Engine<P>, auth: &Credentials) -> Result<User, CliError> {
    engine
        .login(&auth.login, &auth.password)
        .cloned()
        .ok_or(CliError::AuthenticationFailed)
}

fn login_admin<P: Persistence>(engine: &mut Engine<P>, auth: &Credentials) -> Result<User, CliError> {
    let user = login(engine, auth)?;
    if !user.is_admin() {
        return Err(CliError::PermissionDenied);
    }
    Ok(user)
}

/// Standard users may only touch their own bookings. Returns the booking's owner.
fn owned_booking<P: Persistence>(engine: &Engine<P>, user: &User, id: Ulid) -> Result<Ulid, CliError> {
    let booking = engine.get_booking(&id).ok_or(CliError::NotFound(id))?;
    if !user.is_admin() && booking.user_id != user.id {
        return Err(CliError::PermissionDenied);
    }
    Ok(booking.user_id)
}

/// Build the draft for `user_id`. Only rooms with the active status are offered
/// for booking, so any other id is rejected as input.
fn draft<P: Persistence>(engine: &Engine<P>, args: &BookingArgs, user_id: Ulid) -> Result<NewBooking, CliError> {
    if !engine.active_rooms().iter().any(|r| r.id == args.room) {
        return Err(CliError::InvalidInput(format!("room {} is not available for booking", args.room)));
    }
    Ok(NewBooking::new(&args.description, args.room, user_id, args.start, args.end)?)
}

fn write_out(out: &mut impl std::io::Write, line: std::fmt::Arguments) -> Result<(), CliError> {
    out.write_fmt(line)
        .and_then(|()| out.write_all(b"\n"))
        .map_err(|e| CliError::Storage(PersistError::Io(e)))
}

macro_rules! say {
    ($out:expr, $($arg:tt)*) => {
        write_out($out, format_args!($($arg)*))?
    };
}

pub fn execute<P: Persistence>(
    engine: &mut Engine<P>,
    command: Command,
    out: &mut impl std::io::Write,
) -> Result<(), CliError> {
    match command {
        Command::List { collection, auth } => {
            let user = login(engine, &auth)?;
            if collection != Collection::Bookings && !user.is_admin() {
                return Err(CliError::PermissionDenied);
            }
            list(engine, collection, &user, out)?;
        }
        Command::AddStatus { name, auth } => {
            login_admin(engine, &auth)?;
            let status = engine.create_status(NewStatus::new(&name)?)?;
            say!(out, "created status {} {}", status.id, status.name);
        }
        Command::AddRoom { name, status, capacity, description, auth } => {
            login_admin(engine, &auth)?;
            let room = engine.create_room(NewRoom::new(&name, status, capacity, description.as_deref())?)?;
            say!(out, "created room {} {}", room.id, room.name);
        }
        Command::AddUser { name, new_login, new_password, admin, auth } => {
            login_admin(engine, &auth)?;
            let role = if admin { Role::Admin } else { Role::Standard };
            let user = engine.create_user(NewUser::new(&name, &new_login, &new_password, role)?)?;
            say!(out, "created user {} {}", user.id, user.login);
        }
        Command::Book { booking, auth } => {
            let user = login(engine, &auth)?;
            let new_booking = draft(engine, &booking, user.id)?;
            let created = engine.create_booking(new_booking)?;
            say!(
                out,
                "booked {} in {} ({}h)",
                created.id,
                engine.room_label(&created.room_id),
                created.duration_hours
            );
        }
        Command::Reschedule { id, booking, auth } => {
            let user = login(engine, &auth)?;
            let owner = owned_booking(engine, &user, id)?;
            let new_booking = draft(engine, &booking, owner)?;
            let updated = engine.update_booking(id, new_booking)?;
            say!(out, "updated {} ({}h)", updated.id, updated.duration_hours);
        }
        Command::Cancel { id, auth } => {
            let user = login(engine, &auth)?;
            owned_booking(engine, &user, id)?;
            engine.delete_booking(id)?;
            say!(out, "cancelled {id}");
        }
        Command::Delete { kind, id, auth } => {
            login_admin(engine, &auth)?;
            let removed = match kind {
                EntityKind::Room => engine.delete_room(id)?,
                EntityKind::Status => engine.delete_status(id)?,
                EntityKind::User => engine.delete_user(id)?,
                EntityKind::Booking => engine.delete_booking(id)?,
            };
            if !removed {
                return Err(CliError::NotFound(id));
            }
            say!(out, "deleted {id}");
        }
        Command::Check { room, start, end, exclude } => {
            if end <= start {
                return Err(ValidationError::EndNotAfterStart.into());
            }
            if engine.check_booking_conflict(room, start, end, exclude) {
                say!(out, "conflict");
            } else {
                say!(out, "free");
            }
        }
        Command::Stats { auth } => {
            let user = login(engine, &auth)?;
            dashboard(engine, &user, out)?;
        }
        Command::Compact { auth } => {
            login_admin(engine, &auth)?;
            engine.compact()?;
            say!(out, "compacted");
        }
    }
    Ok(())
}

fn list<P: Persistence>(
    engine: &Engine<P>,
    collection: Collection,
    viewer: &User,
    out: &mut impl std::io::Write,
) -> Result<(), CliError> {
    match collection {
        Collection::Statuses => {
            for s in engine.statuses() {
                say!(out, "{}  {}", s.id, s.name);
            }
        }
        Collection::Rooms => {
            for r in engine.rooms() {
                say!(
                    out,
                    "{}  {}  cap {}  [{}]  {}",
                    r.id,
                    r.name,
                    r.capacity,
                    engine.status_label(&r.status_id),
                    r.description.as_deref().unwrap_or("")
                );
            }
        }
        Collection::Users => {
            for u in engine.users() {
                let role = if u.is_admin() { "admin" } else { "user" };
                say!(out, "{}  {}  {}  {}", u.id, u.login, u.name, role);
            }
        }
        Collection::Bookings => {
            for b in engine.visible_bookings(viewer) {
                say!(
                    out,
                    "{}  {} → {}  {}h  {}  {}  {}",
                    b.id,
                    b.start_date_time.to_rfc3339(),
                    b.end_date_time.to_rfc3339(),
                    b.duration_hours,
                    engine.room_label(&b.room_id),
                    engine.user_label(&b.user_id),
                    b.description
                );
            }
        }
    }
    Ok(())
}

fn dashboard<P: Persistence>(engine: &Engine<P>, user: &User, out: &mut impl std::io::Write) -> Result<(), CliError> {
    say!(out, "Olá, {}!", user.name);
    if user.is_admin() {
        let stats = engine.admin_stats();
        say!(out, "rooms: {}", stats.total_rooms);
        say!(out, "users: {}", stats.total_users);
        say!(out, "bookings: {}", stats.total_bookings);
        say!(out, "utilization: {}%", stats.utilization_rate);
        say!(out, "completed events: {}", stats.completed_events);
        say!(out, "most used rooms:");
        for (rank, usage) in stats.top_rooms(RANKING_SIZE).iter().enumerate() {
            say!(out, "  {}. {} ({})", rank + 1, usage.room_name, usage.count);
        }
    } else {
        let stats = engine.user_stats(user.id);
        say!(out, "bookings: {}", stats.total_bookings);
        say!(out, "hours: {}h", stats.total_hours);
        say!(out, "longest meeting: {}h", stats.longest_meeting_hours);
        say!(out, "favorite room: {}", stats.favorite_room.as_deref().unwrap_or("-"));
        say!(out, "achievements:");
        for a in engine.achievements(user.id) {
            let mark = if a.unlocked { "x" } else { " " };
            say!(out, "  [{mark}] {} - {}", a.title, a.description);
        }
    }
    say!(out, "recent activity:");
    for b in engine.recent_bookings(user, RECENT_ACTIVITY_SIZE) {
        say!(
            out,
            "  {}  {}  {} • {}h",
            b.start_date_time.format("%d/%m/%Y"),
            b.description,
            engine.room_label(&b.room_id),
            b.duration_hours
        );
    }
    Ok(())
}

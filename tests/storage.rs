//! End-to-end runs through `Config` and the CLI against real files.

use std::path::PathBuf;

use roombook::cli::{self, BookingArgs, CliError, Command, Credentials, EntityKind};
use roombook::config::{Config, StorageKind};
use roombook::engine::Engine;
use ulid::Ulid;

fn data_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("roombook_it").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn config(name: &str, storage: StorageKind) -> Config {
    Config { data_dir: data_dir(name), storage, ..Config::default() }
}

fn admin() -> Credentials {
    Credentials { login: "admin".into(), password: "admin123".into() }
}

fn joao() -> Credentials {
    Credentials { login: "joao".into(), password: "user123".into() }
}

fn book(start: &str, end: &str) -> Command {
    Command::Book {
        booking: BookingArgs {
            room: Ulid(12),
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
            description: "Planejamento".into(),
        },
        auth: joao(),
    }
}

fn run(command: Command, config: &Config) -> Result<String, CliError> {
    let mut out = Vec::new();
    cli::run(command, config, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn bookings_after_reopen(config: &Config) -> usize {
    let engine = Engine::open(config.open_persistence().unwrap()).unwrap();
    engine.bookings().len()
}

#[test]
fn wal_keeps_bookings_between_runs() {
    let config = config("wal_runs", StorageKind::Wal);
    run(book("2024-05-02T09:00:00Z", "2024-05-02T10:00:00Z"), &config).unwrap();
    let err = run(book("2024-05-02T09:30:00Z", "2024-05-02T10:30:00Z"), &config).unwrap_err();
    assert!(matches!(err, CliError::ScheduleConflict(_)));
    run(book("2024-05-02T10:00:00Z", "2024-05-02T11:00:00Z"), &config).unwrap();

    assert!(config.storage_path().exists());
    assert_eq!(bookings_after_reopen(&config), 2);
}

#[test]
fn json_document_layout() {
    let config = config("json_layout", StorageKind::Json);
    run(book("2024-05-02T09:00:00Z", "2024-05-02T10:30:00Z"), &config).unwrap();

    let text = std::fs::read_to_string(config.storage_path()).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    for key in ["rooms", "statuses", "bookings", "users"] {
        assert!(doc[key].is_array(), "missing {key}");
    }
    let booking = &doc["bookings"][0];
    assert_eq!(booking["roomId"], Ulid(12).to_string());
    assert_eq!(booking["startDateTime"], "2024-05-02T09:00:00Z");
    assert_eq!(booking["durationHours"], 1.5);
    assert_eq!(doc["users"][0]["type"], "admin");

    assert_eq!(bookings_after_reopen(&config), 1);
}

#[test]
fn compact_command_keeps_state() {
    let config = config("compact_cmd", StorageKind::Wal);
    run(book("2024-05-02T09:00:00Z", "2024-05-02T10:00:00Z"), &config).unwrap();
    let before = std::fs::metadata(config.storage_path()).unwrap().len();
    run(Command::Cancel { id: first_booking(&config), auth: joao() }, &config).unwrap();

    assert_eq!(run(Command::Compact { auth: admin() }, &config).unwrap(), "compacted\n");
    assert!(std::fs::metadata(config.storage_path()).unwrap().len() < before);
    assert_eq!(bookings_after_reopen(&config), 0);
}

fn first_booking(config: &Config) -> Ulid {
    let engine = Engine::open(config.open_persistence().unwrap()).unwrap();
    engine.bookings()[0].id
}

#[test]
fn emptied_json_store_stays_empty() {
    let config = config("json_emptied", StorageKind::Json);
    for (kind, id) in [
        (EntityKind::Status, 1),
        (EntityKind::Status, 2),
        (EntityKind::Status, 3),
        (EntityKind::Room, 11),
        (EntityKind::Room, 12),
        (EntityKind::Room, 13),
        (EntityKind::User, 22),
        (EntityKind::User, 21),
    ] {
        run(Command::Delete { kind, id: Ulid(id), auth: admin() }, &config).unwrap();
    }

    let err = run(Command::Stats { auth: admin() }, &config).unwrap_err();
    assert!(matches!(err, CliError::AuthenticationFailed));
    let engine = Engine::open(config.open_persistence().unwrap()).unwrap();
    assert!(engine.users().is_empty());
    assert!(engine.rooms().is_empty());
}

#[test]
fn unreadable_json_is_a_storage_error() {
    let config = config("bad_json", StorageKind::Json);
    std::fs::create_dir_all(&config.data_dir).unwrap();
    std::fs::write(config.storage_path(), "{ not json").unwrap();
    let err = run(Command::Compact { auth: admin() }, &config).unwrap_err();
    assert!(matches!(err, CliError::Storage(_)));
    assert_eq!(err.exit_code(), 5);
}

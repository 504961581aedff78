use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use roombook::engine::{Engine, EngineError};
use roombook::model::{NewBooking, HOUR_MS};
use roombook::persistence::{MemoryPersistence, WalPersistence};
use ulid::Ulid;

const ROOMS: [Ulid; 3] = [Ulid(11), Ulid(12), Ulid(13)];
const USER: Ulid = Ulid(22);

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn slot(hour: i64, len_hours: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = base() + chrono::Duration::milliseconds(hour * HOUR_MS);
    (start, start + chrono::Duration::milliseconds(len_hours * HOUR_MS))
}

fn draft(room: Ulid, hour: i64, len_hours: i64) -> NewBooking {
    let (start, end) = slot(hour, len_hours);
    NewBooking::new("bench", room, USER, start, end).unwrap()
}

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies.last().unwrap().as_secs_f64() * 1000.0,
    );
}

/// One-hour bookings back to back on every room, none conflicting.
fn phase1_sequential_writes(n: i64) -> Engine<MemoryPersistence> {
    let mut engine = Engine::open(MemoryPersistence::new()).unwrap();
    let start = Instant::now();
    for i in 0..n {
        for room in ROOMS {
            engine.create_booking(draft(room, i, 1)).unwrap();
        }
    }
    let elapsed = start.elapsed();
    let ops = (n * ROOMS.len() as i64) as f64 / elapsed.as_secs_f64();
    println!("  {} bookings in {:.2}s = {ops:.0} ops/sec", n * ROOMS.len() as i64, elapsed.as_secs_f64());
    engine
}

/// Attempts that land on already booked hours; every one must be rejected.
fn phase2_conflicts(engine: &mut Engine<MemoryPersistence>, n: i64) {
    let mut latencies = Vec::with_capacity(n as usize);
    for i in 0..n {
        let t = Instant::now();
        let result = engine.create_booking(draft(ROOMS[(i % 3) as usize], i, 2));
        latencies.push(t.elapsed());
        assert!(matches!(result, Err(EngineError::Conflict(_))));
    }
    print_latency("rejected create", &mut latencies);

    let mut latencies = Vec::with_capacity(n as usize);
    for i in 0..n {
        let (start, end) = slot(i, 1);
        let t = Instant::now();
        let busy = engine.check_booking_conflict(ROOMS[0], start, end, None);
        latencies.push(t.elapsed());
        assert!(busy);
    }
    print_latency("check_booking_conflict", &mut latencies);
}

fn phase3_stats(engine: &Engine<MemoryPersistence>, n: usize) {
    let mut latencies = Vec::with_capacity(n);
    for _ in 0..n {
        let t = Instant::now();
        let stats = engine.admin_stats();
        latencies.push(t.elapsed());
        assert_eq!(stats.most_used_rooms.len(), ROOMS.len());
    }
    print_latency("admin_stats", &mut latencies);

    let mut latencies = Vec::with_capacity(n);
    for _ in 0..n {
        let t = Instant::now();
        let _ = engine.achievements(USER);
        latencies.push(t.elapsed());
    }
    print_latency("user stats + achievements", &mut latencies);
}

fn phase4_wal(n: i64) {
    let dir = std::env::temp_dir().join("roombook_bench");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("bench_{}.wal", Ulid::new()));

    let mut engine = Engine::open(WalPersistence::open(&path).unwrap()).unwrap();
    let mut latencies = Vec::with_capacity(n as usize);
    for i in 0..n {
        let t = Instant::now();
        engine.create_booking(draft(ROOMS[0], i, 1)).unwrap();
        latencies.push(t.elapsed());
    }
    print_latency("fsynced create", &mut latencies);

    let t = Instant::now();
    let reopened = Engine::open(WalPersistence::open(&path).unwrap()).unwrap();
    println!("  replayed {} bookings in {:.2}ms", reopened.bookings().len(), t.elapsed().as_secs_f64() * 1000.0);

    let _ = std::fs::remove_file(&path);
}

fn main() {
    println!("=== roombook stress benchmark ===\n");

    println!("[phase 1] sequential write throughput");
    let mut engine = phase1_sequential_writes(2_000);

    println!("\n[phase 2] conflict detection");
    phase2_conflicts(&mut engine, 2_000);

    println!("\n[phase 3] statistics over {} bookings", engine.bookings().len());
    phase3_stats(&engine, 200);

    println!("\n[phase 4] WAL write and replay");
    phase4_wal(500);
}

use std::net::SocketAddr;

// ── Engine metrics ──────────────────────────────────────────────

/// Counter: applied mutations. Labels: entity, op.
pub const MUTATIONS_TOTAL: &str = "roombook_mutations_total";

/// Counter: bookings rejected because they overlap an existing booking.
pub const BOOKING_CONFLICTS_TOTAL: &str = "roombook_booking_conflicts_total";

/// Counter: login attempts with an unknown login or wrong password.
pub const LOGIN_FAILURES_TOTAL: &str = "roombook_login_failures_total";

/// Histogram: time to persist one event, in seconds.
pub const PERSIST_DURATION_SECONDS: &str = "roombook_persist_duration_seconds";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

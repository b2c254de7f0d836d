//! Request accounting and Prometheus text exposition.

use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;

/// Content type for the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Thread-safe counters describing traffic handled by the service.
pub struct RequestMetrics {
    requests_total: AtomicU64,
    users_created: AtomicU64,
    created_at: i64,
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            users_created: AtomicU64::new(0),
            created_at: OffsetDateTime::now_utc().unix_timestamp(),
        }
    }
}

impl RequestMetrics {
    /// Create an empty metrics accumulator stamped with the current time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one inbound HTTP request.
    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successfully created user.
    pub fn record_user_created(&self) {
        self.users_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_created: self.created_at,
            users_created_total: self.users_created.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the request counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Requests observed since startup.
    pub requests_total: u64,
    /// Unix timestamp (seconds) at which the request counter was created.
    pub requests_created: i64,
    /// Users successfully created since startup.
    pub users_created_total: u64,
}

/// Render a snapshot in the Prometheus text exposition format.
pub fn render_prometheus(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();
    push_metric(
        &mut out,
        "app_requests_total",
        "Total HTTP requests",
        "counter",
        snapshot.requests_total,
    );
    push_metric(
        &mut out,
        "app_requests_created",
        "Total HTTP requests",
        "gauge",
        snapshot.requests_created,
    );
    push_metric(
        &mut out,
        "app_users_created_total",
        "Total users created",
        "counter",
        snapshot.users_created_total,
    );
    out
}

fn push_metric(out: &mut String, name: &str, help: &str, kind: &str, value: impl std::fmt::Display) {
    out.push_str(&format!("# HELP {name} {help}\n"));
    out.push_str(&format!("# TYPE {name} {kind}\n"));
    out.push_str(&format!("{name} {value}\n"));
}

#![deny(missing_docs)]

//! Core library for the user registry HTTP service.

/// HTTP routing, handlers, and request accounting middleware.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Static health reporting.
pub mod health;
/// Structured logging and tracing setup.
pub mod logging;
/// Request counters and Prometheus exposition.
pub mod metrics;
/// In-memory user store.
pub mod store;

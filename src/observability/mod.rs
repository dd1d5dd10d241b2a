//! Observability: Prometheus metrics exposed through the HTTP server.

pub mod metrics;

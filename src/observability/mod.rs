//! Observability infrastructure.
//!
//! Provides:
//! - Structured tracing
//! - Prometheus metrics for catalog operations
//! - HTTP endpoints for Prometheus scraping and health checks

pub mod metrics;
pub mod prometheus;
pub mod tracing;

//! Shelf: a goods catalog service with transactional priority reordering.
//!
//! Items are scoped by project and ordered by a single global priority
//! space. Reordering renumbers every item at or above the requested rank in
//! one write transaction, list pages are served through a read-through
//! cache that is dropped after every mutation, and each mutated row is
//! announced on a best-effort change log.
//!
//! # Architecture
//!
//! - **Store**: SQLite (WAL) behind an r2d2 pool; all writers serialize on
//!   the database write lock inside `BEGIN IMMEDIATE` transactions
//! - **Cache**: in-process moka cache of serialized list pages with a TTL
//! - **Change log**: broadcast bus drained by an event sink task
//! - **Orchestrator**: sequences validation, store, cache and change log
//!
//! # Modules
//!
//! - [`cache`]: List page cache
//! - [`config`]: CLI and environment configuration
//! - [`events`]: Change events, notification bus and event sink
//! - [`http`]: axum routes and error mapping
//! - [`model`]: Items, list pages and priority deltas
//! - [`observability`]: Metrics and tracing setup
//! - [`server`]: Server state and lifecycle
//! - [`service`]: Mutation orchestrator and input validation
//! - [`storage`]: SQLite persistence layer

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // storage::items::SqliteItemStore is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::needless_raw_string_hashes, // r#""# is fine for SQL
    clippy::too_many_lines              // Some functions are inherently long
)]

pub mod cache;
pub mod config;
pub mod events;
pub mod http;
pub mod model;
pub mod observability;
pub mod server;
pub mod service;
pub mod storage;

use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable) event ID.
///
/// Change events are delivered at least once; consumers use the ID to
/// discard duplicates and the time ordering to sequence them.
///
/// # Example
///
/// ```
/// let id = shelf::generate_event_id();
/// assert!(id.len() == 36); // UUID string format
/// ```
#[must_use]
pub fn generate_event_id() -> String {
    Uuid::now_v7().to_string()
}

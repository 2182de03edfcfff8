//! SQLite storage layer for Shelf.
//!
//! Provides:
//! - Schema initialization and migrations
//! - Pooled read/write connections
//! - The item store, including the transactional priority shift

pub mod items;
pub mod pool;
pub mod schema;

pub use items::SqliteItemStore;
pub use pool::ConnectionPool;

use thiserror::Error;

use crate::model::{Item, ItemDraft, ListPage, PriorityChange};

pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matches the id/project pair. A project mismatch is reported
    /// the same way as a missing id.
    #[error("good {id} not found in project {project_id}")]
    NotFound { id: i64, project_id: i64 },

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Shifting the band would push a row past `i64::MAX`.
    #[error("priority of good {id} cannot be shifted any higher")]
    PriorityOverflow { id: i64 },

    #[error("database schema version {found} is newer than supported {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Durable, transactional persistence of items.
///
/// Calls block on database I/O; async callers run them on the blocking
/// thread pool.
pub trait ItemStore: Send + Sync {
    /// Insert a new item. The backend assigns id, priority (0), removed
    /// (false) and the creation time.
    fn create(&self, project_id: i64, draft: &ItemDraft) -> StoreResult<Item>;

    /// Mark the item removed. Removing an already removed item succeeds.
    fn soft_delete(&self, id: i64, project_id: i64) -> StoreResult<Item>;

    /// Replace the name and, when the draft carries one, the description.
    fn update(&self, id: i64, project_id: i64, draft: &ItemDraft) -> StoreResult<Item>;

    /// Move the item to `new_priority`, shifting every other item at or
    /// above that rank up by one. Returns the shifted items followed by the
    /// target.
    fn reprioritize(
        &self,
        id: i64,
        project_id: i64,
        new_priority: i64,
    ) -> StoreResult<Vec<PriorityChange>>;

    /// Read up to `limit` items ordered by id, skipping `offset` rows.
    fn list(&self, limit: u32, offset: u32) -> StoreResult<ListPage>;
}

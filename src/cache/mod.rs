//! Read-through cache of serialized list pages.
//!
//! Entries are keyed by the exact `(limit, offset)` pair and hold the JSON
//! body that was served for it, so a hit is byte-identical to the miss that
//! populated it. Any mutation drops every entry; partial invalidation is
//! never attempted.

pub mod memory;

pub use memory::MokaPageCache;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for cache operations. Never surfaced to clients.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Cache key for one pagination window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey(String);

impl PageKey {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self(format!("{limit}-{offset}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cache of serialized list pages.
#[async_trait]
pub trait PageCache: Send + Sync {
    /// Look up a page. A miss is `Ok(None)`.
    async fn lookup(&self, key: &PageKey) -> Result<Option<String>, CacheError>;

    /// Store a page, overwriting any previous entry for the key.
    async fn store(&self, key: PageKey, payload: String) -> Result<(), CacheError>;

    /// Drop every cached page.
    async fn invalidate_all(&self) -> Result<(), CacheError>;
}

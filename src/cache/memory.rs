//! In-process page cache backed by moka.

use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

use super::{CacheError, PageCache, PageKey};

/// TTL-bounded, capacity-bounded page cache.
///
/// Cloning is cheap and every clone shares the same entries.
#[derive(Clone)]
pub struct MokaPageCache {
    inner: Cache<PageKey, String>,
}

impl MokaPageCache {
    /// # Arguments
    ///
    /// * `max_capacity` - Maximum number of cached pages
    /// * `ttl` - Time a page stays valid after it is stored
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }
}

#[async_trait]
impl PageCache for MokaPageCache {
    async fn lookup(&self, key: &PageKey) -> Result<Option<String>, CacheError> {
        Ok(self.inner.get(key).await)
    }

    async fn store(&self, key: PageKey, payload: String) -> Result<(), CacheError> {
        self.inner.insert(key, payload).await;
        Ok(())
    }

    async fn invalidate_all(&self) -> Result<(), CacheError> {
        self.inner.invalidate_all();
        Ok(())
    }
}

//! Mutation orchestrator for the goods catalog.
//!
//! Each mutation validates its input, then hands the store call and the
//! side effects that follow it to a spawned task. On success that task drops
//! the page cache and publishes change events. Dropping the request future
//! only abandons the response: a committed write is always followed by its
//! invalidation and events. Cache and change log failures are logged and
//! counted, never returned.

pub mod error;
pub mod validate;

pub use error::{ServiceError, ServiceResult};

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::cache::{PageCache, PageKey};
use crate::events::{ChangeEvent, ChangeKind, ChangeNotifier};
use crate::model::{Item, ItemDraft, PriorityChange};
use crate::observability::metrics::{
    record_cache_lookup, record_operation, record_side_effect_failure,
};
use crate::storage::{ItemStore, StoreResult};

/// Store, cache and notifier as one cloneable bundle, so a mutation can
/// outlive the request that started it.
#[derive(Clone)]
struct Backends {
    store: Arc<dyn ItemStore>,
    cache: Arc<dyn PageCache>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl Backends {
    /// Run a store call on the blocking pool.
    async fn with_store<T, F>(&self, call: F) -> ServiceResult<T>
    where
        F: FnOnce(&dyn ItemStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || call(store.as_ref()))
            .await
            .map_err(|e| ServiceError::Persistence(format!("store task failed: {e}")))?;

        result.map_err(|e| {
            if !e.is_not_found() {
                tracing::error!(error = %e, "Store operation failed");
            }
            ServiceError::from(e)
        })
    }

    async fn invalidate_pages(&self) {
        if let Err(e) = self.cache.invalidate_all().await {
            record_side_effect_failure("cache");
            tracing::warn!(error = %e, "Failed to invalidate page cache");
        }
    }

    async fn publish(&self, event: ChangeEvent) {
        if let Err(e) = self.notifier.publish(&event).await {
            record_side_effect_failure("publish");
            tracing::warn!(
                event_id = %event.event_id,
                id = event.id,
                error = %e,
                "Failed to publish change event"
            );
        }
    }
}

/// Catalog service shared by every request handler.
pub struct GoodsService {
    backends: Backends,
}

/// Record latency and outcome of one operation.
fn observe<T>(operation: &str, start: Instant, result: &ServiceResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    };
    record_operation(operation, outcome, start.elapsed().as_secs_f64());
}

impl GoodsService {
    pub fn new(
        store: Arc<dyn ItemStore>,
        cache: Arc<dyn PageCache>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            backends: Backends {
                store,
                cache,
                notifier,
            },
        }
    }

    /// Run `call` and, once it succeeds, invalidate the cache and publish
    /// `events(&value)`. The work runs in its own task and finishes even if
    /// the caller stops waiting.
    async fn mutate<T, F, E>(&self, call: F, events: E) -> ServiceResult<T>
    where
        F: FnOnce(&dyn ItemStore) -> StoreResult<T> + Send + 'static,
        E: FnOnce(&T) -> Vec<ChangeEvent> + Send + 'static,
        T: Send + 'static,
    {
        let backends = self.backends.clone();
        let task = async move {
            let value = backends.with_store(call).await?;

            backends.invalidate_pages().await;
            for event in events(&value) {
                backends.publish(event).await;
            }
            Ok(value)
        };

        tokio::spawn(task.instrument(tracing::Span::current()))
            .await
            .map_err(|e| ServiceError::Persistence(format!("mutation task failed: {e}")))?
    }

    /// Create an item in `project_id`.
    #[tracing::instrument(skip(self, draft))]
    pub async fn create(&self, project_id: i64, draft: ItemDraft) -> ServiceResult<Item> {
        let start = Instant::now();
        let result: ServiceResult<Item> = async {
            validate::draft(&draft)?;
            let item = self
                .mutate(
                    move |store| store.create(project_id, &draft),
                    |item: &Item| vec![ChangeEvent::for_item(ChangeKind::Created, item)],
                )
                .await?;
            tracing::debug!(id = item.id, "Good created");
            Ok(item)
        }
        .await;
        observe("create", start, &result);
        result
    }

    /// Soft-delete an item. Removing an already removed item succeeds.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: i64, project_id: i64) -> ServiceResult<Item> {
        let start = Instant::now();
        let result = self
            .mutate(
                move |store| store.soft_delete(id, project_id),
                |item: &Item| vec![ChangeEvent::for_item(ChangeKind::Removed, item)],
            )
            .await;
        observe("remove", start, &result);
        result
    }

    /// Rename an item and, if given, replace its description.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update(&self, id: i64, project_id: i64, draft: ItemDraft) -> ServiceResult<Item> {
        let start = Instant::now();
        let result: ServiceResult<Item> = async {
            validate::draft(&draft)?;
            self.mutate(
                move |store| store.update(id, project_id, &draft),
                |item: &Item| vec![ChangeEvent::for_item(ChangeKind::Updated, item)],
            )
            .await
        }
        .await;
        observe("update", start, &result);
        result
    }

    /// Move an item to `new_priority`, shifting the band above it.
    ///
    /// Publishes one event per changed row in store order, target last.
    #[tracing::instrument(skip(self))]
    pub async fn reprioritize(
        &self,
        id: i64,
        project_id: i64,
        new_priority: i64,
    ) -> ServiceResult<Vec<PriorityChange>> {
        let start = Instant::now();
        let result: ServiceResult<Vec<PriorityChange>> = async {
            validate::priority(new_priority)?;
            let changes = self
                .mutate(
                    move |store| store.reprioritize(id, project_id, new_priority),
                    move |changes: &Vec<PriorityChange>| {
                        changes
                            .iter()
                            .map(|change| {
                                let project = (change.id == id).then_some(project_id);
                                ChangeEvent::for_priority(change, project)
                            })
                            .collect()
                    },
                )
                .await?;
            tracing::debug!(shifted = changes.len().saturating_sub(1), "Good reprioritized");
            Ok(changes)
        }
        .await;
        observe("reprioritize", start, &result);
        result
    }

    /// Serialized list page for `(limit, offset)`, served from the cache
    /// when possible.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, limit: u32, offset: u32) -> ServiceResult<String> {
        let start = Instant::now();
        let backends = &self.backends;
        let result: ServiceResult<String> = async {
            let key = PageKey::new(limit, offset);
            match backends.cache.lookup(&key).await {
                Ok(Some(payload)) => {
                    record_cache_lookup("hit");
                    return Ok(payload);
                }
                Ok(None) => record_cache_lookup("miss"),
                Err(e) => {
                    record_cache_lookup("error");
                    tracing::warn!(key = key.as_str(), error = %e, "Page cache lookup failed");
                }
            }

            let page = backends
                .with_store(move |store| store.list(limit, offset))
                .await?;
            let payload = serde_json::to_string(&page)
                .map_err(|e| ServiceError::Persistence(format!("failed to encode page: {e}")))?;

            if let Err(e) = backends.cache.store(key.clone(), payload.clone()).await {
                record_side_effect_failure("cache");
                tracing::warn!(key = key.as_str(), error = %e, "Failed to cache page");
            }
            Ok(payload)
        }
        .await;
        observe("list", start, &result);
        result
    }
}

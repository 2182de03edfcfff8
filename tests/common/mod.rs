//! Test utilities and in-process app harness for Shelf tests.
//!
//! Provides:
//! - Temporary database fixtures
//! - An axum router wired to a real SQLite store
//! - Cache and notifier fakes that always fail

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use shelf::cache::{CacheError, MokaPageCache, PageCache, PageKey};
use shelf::events::{ChangeEvent, ChangeNotifier, EventBus, PublishError};
use shelf::http::create_router;
use shelf::model::{Item, ItemDraft, ListPage, PriorityChange};
use shelf::service::GoodsService;
use shelf::storage::{ConnectionPool, ItemStore, SqliteItemStore, StoreResult};

/// Test fixture that manages a temporary database directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for test database
    pub temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        Self { temp_dir, db_path }
    }

    /// Open a pool on the fixture database.
    pub fn pool(&self) -> ConnectionPool {
        ConnectionPool::open(&self.db_path, 8, Duration::from_secs(5)).expect("failed to open pool")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Store wrapper counting list queries.
pub struct CountingStore {
    inner: SqliteItemStore,
    lists: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: SqliteItemStore) -> Self {
        Self {
            inner,
            lists: AtomicUsize::new(0),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

impl ItemStore for CountingStore {
    fn create(&self, project_id: i64, draft: &ItemDraft) -> StoreResult<Item> {
        self.inner.create(project_id, draft)
    }

    fn soft_delete(&self, id: i64, project_id: i64) -> StoreResult<Item> {
        self.inner.soft_delete(id, project_id)
    }

    fn update(&self, id: i64, project_id: i64, draft: &ItemDraft) -> StoreResult<Item> {
        self.inner.update(id, project_id, draft)
    }

    fn reprioritize(
        &self,
        id: i64,
        project_id: i64,
        new_priority: i64,
    ) -> StoreResult<Vec<PriorityChange>> {
        self.inner.reprioritize(id, project_id, new_priority)
    }

    fn list(&self, limit: u32, offset: u32) -> StoreResult<ListPage> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list(limit, offset)
    }
}

/// Cache whose every call fails, as a remote cache does when unreachable.
pub struct UnreachableCache;

#[async_trait]
impl PageCache for UnreachableCache {
    async fn lookup(&self, _key: &PageKey) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn store(&self, _key: PageKey, _payload: String) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn invalidate_all(&self) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}

/// Notifier that rejects every event.
pub struct ClosedNotifier;

#[async_trait]
impl ChangeNotifier for ClosedNotifier {
    async fn publish(&self, _event: &ChangeEvent) -> Result<(), PublishError> {
        Err(PublishError::Closed)
    }
}

/// In-process application: router, service and the collaborators behind it.
pub struct TestApp {
    pub fixture: TestFixture,
    pub store: Arc<CountingStore>,
    pub events: EventBus,
    pub service: Arc<GoodsService>,
    pub router: Router,
}

impl TestApp {
    /// App with the production cache and event bus.
    pub fn new() -> Self {
        Self::with_parts(None, None)
    }

    /// App with optional replacements for the cache and the notifier.
    pub fn with_parts(
        cache: Option<Arc<dyn PageCache>>,
        notifier: Option<Arc<dyn ChangeNotifier>>,
    ) -> Self {
        let fixture = TestFixture::new();
        let store = Arc::new(CountingStore::new(SqliteItemStore::new(fixture.pool())));
        let events = EventBus::new(256);

        let cache = cache
            .unwrap_or_else(|| Arc::new(MokaPageCache::new(100, Duration::from_secs(60))));
        let notifier = notifier.unwrap_or_else(|| Arc::new(events.clone()));
        let service = Arc::new(GoodsService::new(store.clone(), cache, notifier));
        let router = create_router(Arc::clone(&service), Duration::from_secs(10));

        Self {
            fixture,
            store,
            events,
            service,
            router,
        }
    }

    /// Send a request and return the status and raw body.
    pub async fn send(&self, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .expect("failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();
        (status, bytes.to_vec())
    }

    /// Send a request and decode the body as JSON.
    pub async fn call(&self, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response is not JSON")
        };
        (status, value)
    }

    /// Create an item through the API and return its id.
    pub async fn create(&self, project_id: i64, name: &str) -> i64 {
        let (status, body) = self
            .call(
                Method::POST,
                &format!("/good/create?projectId={project_id}"),
                Some(&format!(r#"{{"name":"{name}"}}"#)),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create failed: {body}");
        body["id"].as_i64().expect("id missing")
    }

    /// Reorder an item through the API and return the response body.
    pub async fn reprioritize(&self, id: i64, project_id: i64, priority: i64) -> (StatusCode, Value) {
        self.call(
            Method::PATCH,
            &format!("/good/reprioritiize?id={id}&projectId={project_id}"),
            Some(&format!(r#"{{"newPriority":{priority}}}"#)),
        )
        .await
    }

    /// Current priority of every item, ordered by id.
    pub async fn priorities(&self) -> Vec<(i64, i64)> {
        let (status, body) = self.call(Method::GET, "/good?limit=1000&offset=0", None).await;
        assert_eq!(status, StatusCode::OK);
        body["goods"]
            .as_array()
            .expect("goods missing")
            .iter()
            .map(|item| {
                (
                    item["id"].as_i64().expect("id missing"),
                    item["priority"].as_i64().expect("priority missing"),
                )
            })
            .collect()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.temp_dir.path().exists());
        assert!(fixture.db_path.ends_with("test.db"));
    }
}

//! HTTP server setup and lifecycle.
//!
//! Builds the shared state once at startup:
//! - SQLite connection pool and item store
//! - List page cache
//! - Change event bus and its sink task
//!
//! then serves the API until the shutdown signal fires.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cache::MokaPageCache;
use crate::config::Config;
use crate::events::sink::spawn_event_sink;
use crate::events::EventBus;
use crate::http::create_router;
use crate::observability::metrics::{init_metrics, prometheus_registry};
use crate::observability::prometheus::run_prometheus_server;
use crate::service::GoodsService;
use crate::storage::{ConnectionPool, SqliteItemStore, StoreError};

/// Server state shared across handlers.
pub struct ServerState {
    pub service: Arc<GoodsService>,
    pub pool: ConnectionPool,
    pub events: EventBus,
}

impl ServerState {
    /// Open the database and wire the service to its collaborators.
    pub fn build(config: &Config) -> Result<Self, StoreError> {
        let pool = ConnectionPool::open(config.db_path(), config.pool_size, config.busy_timeout())?;
        let store = Arc::new(SqliteItemStore::new(pool.clone()));
        let cache = Arc::new(MokaPageCache::new(config.cache_capacity, config.cache_ttl()));
        let events = EventBus::new(config.notify_channel_size);

        let service = Arc::new(GoodsService::new(store, cache, Arc::new(events.clone())));

        Ok(Self {
            service,
            pool,
            events,
        })
    }
}

/// Run the Shelf HTTP server.
///
/// # Arguments
///
/// * `config` - Server configuration
/// * `shutdown_rx` - Receiver for shutdown signal
///
/// # Returns
///
/// Returns when the server has shut down and the event sink has drained.
pub async fn run_server(
    config: Config,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    init_metrics();

    let state = ServerState::build(&config)?;
    let sink: JoinHandle<()> = spawn_event_sink(&state.events, config.event_log.clone());

    // Spawn Prometheus metrics server if enabled
    if config.metrics_enabled {
        let metrics_addr: SocketAddr = format!("{}:{}", config.host, config.metrics_port).parse()?;
        let registry = prometheus_registry();
        let metrics_shutdown_rx = shutdown_rx.clone();

        tokio::spawn(async move {
            if let Err(e) = run_prometheus_server(metrics_addr, registry, metrics_shutdown_rx).await {
                tracing::error!(error = %e, "Prometheus server error");
            }
        });
    }

    let app = create_router(Arc::clone(&state.service), config.request_timeout());
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "Starting Shelf HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("Shutdown signal received, stopping server");
        })
        .await?;

    // Dropping the last publisher closes the bus and lets the sink finish.
    let pool_state = state.pool.state();
    drop(state);
    tracing::info!("Draining change events");
    if let Err(e) = sink.await {
        tracing::warn!(error = %e, "Event sink task failed");
    }

    tracing::info!(
        connections = pool_state.connections,
        idle = pool_state.idle_connections,
        "Server stopped"
    );
    Ok(())
}

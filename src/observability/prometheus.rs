//! Operations sidecar: `/metrics` for scraping, `/health` for liveness and
//! `/ready`, which turns 503 once shutdown has begun so load balancers stop
//! routing catalog traffic before the listener closes.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Clone)]
struct Sidecar {
    registry: Arc<Registry>,
    draining: watch::Receiver<bool>,
}

fn sidecar_router(registry: Registry, draining: watch::Receiver<bool>) -> Router {
    let sidecar = Sidecar {
        registry: Arc::new(registry),
        draining,
    };
    Router::new()
        .route("/metrics", get(scrape))
        .route("/health", get(|| async { (StatusCode::OK, "OK") }))
        .route("/ready", get(readiness))
        .with_state(sidecar)
}

async fn scrape(State(sidecar): State<Sidecar>) -> impl IntoResponse {
    let mut body = Vec::new();
    match TextEncoder::new().encode(&sidecar.registry.gather(), &mut body) {
        Ok(()) => (StatusCode::OK, [("content-type", TEXT_FORMAT)], body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                b"metrics unavailable".to_vec(),
            )
        }
    }
}

async fn readiness(State(sidecar): State<Sidecar>) -> impl IntoResponse {
    if *sidecar.draining.borrow() {
        (StatusCode::SERVICE_UNAVAILABLE, "DRAINING")
    } else {
        (StatusCode::OK, "READY")
    }
}

/// Serve the sidecar on `addr` until `shutdown_rx` flips.
pub async fn run_prometheus_server(
    addr: SocketAddr,
    registry: Registry,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = sidecar_router(registry, shutdown_rx.clone());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Starting Prometheus metrics server");

    let mut shutdown_rx = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("Prometheus server shutting down");
        })
        .await?;
    Ok(())
}

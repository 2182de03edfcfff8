//! HTTP interface.
//!
//! Routes:
//! - `GET /good` - List page
//! - `POST /good/create` - Create an item
//! - `DELETE /good/remove` - Soft-delete an item
//! - `PATCH /good/update` - Rename an item
//! - `PATCH /good/reprioritiize` - Move an item in the priority space

pub mod error;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::service::GoodsService;

/// State handed to every handler.
pub type AppState = Arc<GoodsService>;

/// Build the API router.
///
/// Requests running longer than `request_timeout` are answered with 408.
pub fn create_router(service: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/good", get(handlers::list))
        .route("/good/create", post(handlers::create))
        .route("/good/remove", delete(handlers::remove))
        .route("/good/update", patch(handlers::update))
        .route("/good/reprioritiize", patch(handlers::reprioritize))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

//! Request handlers for the `/good` endpoints.
//!
//! Handlers only extract raw query and body values; every check lives in
//! [`validate`] so it runs before the service touches any backend.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use super::AppState;
use crate::model::{Item, Reprioritized};
use crate::service::{validate, ServiceResult};

/// Query string shared by every endpoint. Values stay raw strings so that
/// missing and malformed input produce the same validation errors.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoodsQuery {
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// GET /good
pub async fn list(
    State(service): State<AppState>,
    Query(query): Query<GoodsQuery>,
) -> ServiceResult<impl IntoResponse> {
    let (limit, offset) = validate::page_window(query.limit.as_deref(), query.offset.as_deref())?;
    let payload = service.list(limit, offset).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], payload))
}

/// POST /good/create
pub async fn create(
    State(service): State<AppState>,
    Query(query): Query<GoodsQuery>,
    body: Bytes,
) -> ServiceResult<Json<Item>> {
    let project_id = validate::project_id(query.project_id.as_deref())?;
    let draft = validate::item_body(&body)?;
    Ok(Json(service.create(project_id, draft).await?))
}

/// DELETE /good/remove
pub async fn remove(
    State(service): State<AppState>,
    Query(query): Query<GoodsQuery>,
) -> ServiceResult<Json<Item>> {
    let (id, project_id) = validate::item_key(query.id.as_deref(), query.project_id.as_deref())?;
    Ok(Json(service.remove(id, project_id).await?))
}

/// PATCH /good/update
pub async fn update(
    State(service): State<AppState>,
    Query(query): Query<GoodsQuery>,
    body: Bytes,
) -> ServiceResult<Json<Item>> {
    let (id, project_id) = validate::item_key(query.id.as_deref(), query.project_id.as_deref())?;
    let draft = validate::item_body(&body)?;
    Ok(Json(service.update(id, project_id, draft).await?))
}

/// PATCH /good/reprioritiize
pub async fn reprioritize(
    State(service): State<AppState>,
    Query(query): Query<GoodsQuery>,
    body: Bytes,
) -> ServiceResult<Json<Reprioritized>> {
    let (id, project_id) = validate::item_key(query.id.as_deref(), query.project_id.as_deref())?;
    let new_priority = validate::priority_body(&body)?;
    let priorities = service.reprioritize(id, project_id, new_priority).await?;
    Ok(Json(Reprioritized { priorities }))
}

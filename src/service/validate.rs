//! Input validation.
//!
//! Pure checks with no side effects. Every catalog operation runs them
//! before touching the store, cache or change log. Absent and empty query
//! values are treated alike.

use serde::Deserialize;

use super::{ServiceError, ServiceResult};
use crate::model::ItemDraft;

/// Default page size when `limit` is not given.
pub const DEFAULT_LIMIT: u32 = 10;
/// Default SQL offset when `offset` is not given.
pub const DEFAULT_OFFSET: u32 = 1;

/// JSON body accepted by create, update and reprioritize.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    new_priority: Option<i64>,
}

fn provided(raw: Option<&str>) -> Option<&str> {
    raw.filter(|value| !value.is_empty())
}

fn parse_int<T: std::str::FromStr>(field: &str, raw: &str) -> ServiceResult<T> {
    raw.parse()
        .map_err(|_| ServiceError::validation(format!("{field} must be an integer, got {raw:?}")))
}

fn parse_body(body: &[u8]) -> ServiceResult<RequestBody> {
    serde_json::from_slice(body)
        .map_err(|e| ServiceError::validation(format!("invalid request body: {e}")))
}

/// Parse a required `projectId`.
pub fn project_id(raw: Option<&str>) -> ServiceResult<i64> {
    let raw = provided(raw).ok_or_else(|| ServiceError::validation("projectId not provided"))?;
    parse_int("projectId", raw)
}

/// Parse a required `id` + `projectId` pair.
pub fn item_key(id: Option<&str>, project: Option<&str>) -> ServiceResult<(i64, i64)> {
    let id = provided(id).ok_or_else(|| ServiceError::validation("id not provided"))?;
    let project_id = project_id(project)?;
    Ok((parse_int("id", id)?, project_id))
}

/// Parse `limit` and `offset`, applying defaults.
pub fn page_window(limit: Option<&str>, offset: Option<&str>) -> ServiceResult<(u32, u32)> {
    let limit = provided(limit).map_or(Ok(DEFAULT_LIMIT), |raw| parse_int("limit", raw))?;
    let offset = provided(offset).map_or(Ok(DEFAULT_OFFSET), |raw| parse_int("offset", raw))?;
    Ok((limit, offset))
}

/// Check the writable fields of an item.
pub fn draft(draft: &ItemDraft) -> ServiceResult<()> {
    if draft.name.trim().is_empty() {
        return Err(ServiceError::validation("name not provided"));
    }
    Ok(())
}

/// Check a requested priority. Zero means "not provided".
pub fn priority(new_priority: i64) -> ServiceResult<()> {
    if new_priority == 0 {
        return Err(ServiceError::validation("newPriority not provided"));
    }
    Ok(())
}

/// Parse a create/update body into a checked draft.
pub fn item_body(body: &[u8]) -> ServiceResult<ItemDraft> {
    let body = parse_body(body)?;
    let parsed = ItemDraft::new(body.name, body.description);
    draft(&parsed)?;
    Ok(parsed)
}

/// Parse a reprioritize body into a checked priority.
pub fn priority_body(body: &[u8]) -> ServiceResult<i64> {
    let new_priority = parse_body(body)?.new_priority.unwrap_or_default();
    priority(new_priority)?;
    Ok(new_priority)
}

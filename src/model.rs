//! Catalog records and the views derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted catalog item.
///
/// `id` and `created_at` are assigned by the store and never change.
/// `project_id` is fixed at creation and scopes every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: i64,
    pub removed: bool,
    pub created_at: DateTime<Utc>,
}

/// Writable fields supplied on create and update.
///
/// An empty or absent description means "keep what is stored".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: String,
    pub description: Option<String>,
}

impl ItemDraft {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description: description.filter(|d| !d.is_empty()),
        }
    }
}

/// New priority of one item touched by a reorder.
///
/// Only the id and the priority are known; other item fields are not read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityChange {
    pub id: i64,
    pub priority: i64,
}

/// Response body for a reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reprioritized {
    pub priorities: Vec<PriorityChange>,
}

/// Counters attached to a list page.
///
/// `total` and `removed` cover the whole table, not just the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: u64,
    pub removed: u64,
    pub limit: u32,
    pub offset: u32,
}

/// One page of items ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage {
    pub meta: PageMeta,
    pub goods: Vec<Item>,
}

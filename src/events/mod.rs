//! Change log: one event per mutated row, published after commit.
//!
//! Provides:
//! - [`ChangeEvent`] and the [`ChangeNotifier`] publishing seam
//! - [`EventBus`], a broadcast bus on the fixed `goods` channel
//! - [`sink`], the task that drains the bus into an append-only log
//!
//! Delivery is best-effort: publish failures are logged by the caller and
//! never retried.

pub mod bus;
pub mod sink;

pub use bus::EventBus;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generate_event_id;
use crate::model::{Item, PriorityChange};

/// Logical channel every change event is published on.
pub const CHANGE_CHANNEL: &str = "goods";

/// Error type for publish operations. Never surfaced to clients.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("change log transport is closed")]
    Closed,

    #[error("change log transport unavailable: {0}")]
    Unavailable(String),
}

/// What happened to the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Removed,
    Reprioritized,
}

/// Description of one row mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub event_id: String,
    pub kind: ChangeKind,
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    pub removed: bool,
    pub event_time: DateTime<Utc>,
}

impl ChangeEvent {
    /// Event carrying the full state of a created, updated or removed item.
    pub fn for_item(kind: ChangeKind, item: &Item) -> Self {
        Self {
            event_id: generate_event_id(),
            kind,
            id: item.id,
            project_id: Some(item.project_id),
            name: Some(item.name.clone()),
            description: item.description.clone(),
            priority: Some(item.priority),
            removed: item.removed,
            event_time: Utc::now(),
        }
    }

    /// Event for one row touched by a reorder. Only the target's project is
    /// known; shifted rows are published without one.
    pub fn for_priority(change: &PriorityChange, project_id: Option<i64>) -> Self {
        Self {
            event_id: generate_event_id(),
            kind: ChangeKind::Reprioritized,
            id: change.id,
            project_id,
            name: None,
            description: None,
            priority: Some(change.priority),
            removed: false,
            event_time: Utc::now(),
        }
    }
}

/// Publisher of change events.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), PublishError>;
}

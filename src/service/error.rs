//! Errors visible to callers of the catalog service.

use thiserror::Error;

use crate::storage::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by [`GoodsService`](super::GoodsService).
///
/// Cache and change log failures never appear here; they are logged and
/// the operation continues.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input. Raised before any I/O.
    #[error("{0}")]
    Validation(String),

    #[error("good {id} not found in project {project_id}")]
    NotFound { id: i64, project_id: i64 },

    /// Any backend failure while reading or writing items.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Outcome label used for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid",
            Self::NotFound { .. } => "not_found",
            Self::Persistence(_) => "error",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id, project_id } => Self::NotFound { id, project_id },
            overflow @ StoreError::PriorityOverflow { .. } => Self::Validation(overflow.to_string()),
            other => Self::Persistence(other.to_string()),
        }
    }
}

//! Mapping of service errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::service::ServiceError;

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u8,
    pub message: &'static str,
    pub details: Value,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(reason) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: 2,
                    message: "errors.common.invalidArgument",
                    details: json!({ "reason": reason }),
                },
            ),
            Self::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: 3,
                    message: "errors.common.notFound",
                    details: json!({}),
                },
            ),
            Self::Persistence(cause) => {
                // Cause stays in the logs.
                tracing::error!(error = %cause, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: 1,
                        message: "errors.common.internal",
                        details: json!({}),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

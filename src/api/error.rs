use crate::engine::QueryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

/// Request-path failures, each mapped to a status code and `{"error": ...}` body.
#[derive(Debug)]
pub enum ApiError {
    Query(QueryError),
    Unauthorized,
    NotConfigured(&'static str),
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        ApiError::Query(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // Client mistake; not worth a log line.
            ApiError::Query(QueryError::InvalidKind(_)) => {
                (StatusCode::BAD_REQUEST, "Invalid proxy type".to_string())
            }
            ApiError::Query(e @ QueryError::NotYetAvailable(_)) => {
                warn!("Proxy list requested before it was available: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error reading proxy list".to_string(),
                )
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            ApiError::NotConfigured(what) => {
                (StatusCode::NOT_FOUND, format!("{} is not configured", what))
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

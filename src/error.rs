use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::metrics::MetricsError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        details: serde_json::Value,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Aggregation failed: {0}")]
    Aggregation(#[from] MetricsError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.as_str()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.as_str()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::Conflict { message, .. } => (StatusCode::CONFLICT, message.as_str()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.as_str()),
            AppError::ExternalService(msg) => (StatusCode::BAD_GATEWAY, msg.as_str()),
            AppError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.as_str()),
            AppError::Aggregation(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch dashboard data",
            ),
        };

        tracing::error!("Error response: {} - {}", status, self);

        let body = match &self {
            AppError::Conflict { details, .. } => json!({ "error": message, "details": details }),
            _ => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn conflict_carries_details() {
        let (status, body) = body_json(AppError::Conflict {
            message: "Cannot delete user with associated records".to_string(),
            details: json!({ "hasOrders": true, "hasSupportTickets": false }),
        })
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["details"]["hasOrders"], true);
        assert_eq!(body["error"], "Cannot delete user with associated records");
    }

    #[tokio::test]
    async fn aggregation_failure_hides_cause() {
        let (status, body) =
            body_json(AppError::from(MetricsError::Query("no such table: orders".into()))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch dashboard data");
    }
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid timestamp {0:?}, expected RFC 3339 or HH:MM:SS")]
    InvalidTimestamp(String),

    #[error("Checkpoint {0} does not belong to this race")]
    UnknownCheckpoint(Uuid),

    #[error("Not found")]
    NotFound,

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(e) => {
                error!("Database error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidTimestamp(_) | AppError::UnknownCheckpoint(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Server-side details stay in the logs
        let error_message = match &self {
            AppError::Database(_) | AppError::Internal => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

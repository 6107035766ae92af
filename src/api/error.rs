use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::services::media::MediaToolError;
use crate::services::video_service::PipelineStage;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("media tool failure during {stage}")]
    MediaTool {
        stage: PipelineStage,
        #[source]
        source: MediaToolError,
    },

    #[error("object storage failure")]
    Storage(#[source] anyhow::Error),

    #[error("record persistence failure")]
    Persistence(#[source] sea_orm::DbErr),

    #[error("database error")]
    Database(#[from] sea_orm::DbErr),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            AppError::MediaTool { stage, source } => {
                tracing::error!(%stage, error = %source, "media tool failure");
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Video processing failed during {}", stage),
                )
            }
            AppError::Storage(source) => {
                tracing::error!(error = %source, "object storage failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to store video".to_string(),
                )
            }
            AppError::Persistence(source) => {
                tracing::error!(error = %source, "record update failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to persist video record".to_string(),
                )
            }
            AppError::Database(source) => {
                tracing::error!(error = %source, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

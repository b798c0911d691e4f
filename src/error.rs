//! Server-specific error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use caption_lib::CaptionError;
use thiserror::Error;

use crate::transcribe::TranscribeError;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Caption(#[from] CaptionError),

    #[error(transparent)]
    Transcribe(#[from] TranscribeError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Caption(CaptionError::SourceUnavailable { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::Caption(_) => StatusCode::BAD_REQUEST,
            ServerError::Transcribe(e) => e.status(),
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Config(_) | ServerError::Internal(_) | ServerError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label used for error metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::Caption(CaptionError::MalformedBlock { .. }) => "malformed_block",
            ServerError::Caption(CaptionError::SourceUnavailable { .. }) => "source_unavailable",
            ServerError::Caption(CaptionError::InvalidFormat(_)) => "invalid_format",
            ServerError::Caption(CaptionError::InvalidRecord { .. }) => "invalid_record",
            ServerError::Transcribe(e) => e.kind(),
            ServerError::BadRequest(_) => "bad_request",
            ServerError::Config(_) => "config",
            ServerError::Internal(_) => "internal",
            ServerError::Io(_) => "io",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{}", self);
        } else {
            tracing::debug!(kind = self.kind(), "{}", self);
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

//! HTTP error type shared by all handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::chat::ComposerError;
use crate::document::{DocumentError, LoaderError};

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// Errors surfaced by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or unacceptable input.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// Unknown resource.
    #[error("{0}")]
    NotFound(String),

    /// Upload exceeds the configured size.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The language model call failed.
    #[error("LLM request failed: {0}")]
    Upstream(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Status code for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::Upstream(_) => "LLM_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "Request rejected");
        }
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::UnsupportedType(_) => Self::BadRequest(err.to_string()),
            DocumentError::TooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            DocumentError::NotFound(_) => Self::NotFound(err.to_string()),
            DocumentError::Io(e) => Self::Internal(e.into()),
        }
    }
}

impl From<LoaderError> for AppError {
    fn from(err: LoaderError) -> Self {
        match err {
            LoaderError::UnsupportedType(_) | LoaderError::Csv(_) | LoaderError::Notebook(_) => {
                Self::BadRequest(err.to_string())
            }
            LoaderError::ChunkConfig(_) | LoaderError::Io(_) => Self::Internal(err.into()),
        }
    }
}

impl From<ComposerError> for AppError {
    fn from(err: ComposerError) -> Self {
        match err {
            ComposerError::Attachment(e) => Self::BadRequest(e.to_string()),
            ComposerError::Send(e) => Self::Upstream(format!("{e:#}")),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(err.body_text())
        } else {
            Self::BadRequest(format!("Failed to read multipart field: {err}"))
        }
    }
}

//! # API Error Types
//!
//! Every failure leaves the handler as an [`AppError`] and is rendered as
//! `{"error": {"code", "message"}}`. Storage failures are logged and
//! reported without their underlying detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dca_core::{DcaError, ValidationError};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (`BAD_REQUEST`, `VALIDATION_ERROR`, …).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Request body missing, not JSON, or lacking a required field (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The edited section breaks a configuration rule (422).
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The document could not be read or written (500).
    #[error("configuration storage error: {0}")]
    Storage(#[from] DcaError),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Storage(_) => {
                tracing::error!(error = %self, "configuration storage failure");
                "the configuration could not be stored".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::BadRequest("x".into()).status_and_code().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ValidationError::TotalMismatch { total: 90.0 })
                .status_and_code()
                .0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        let storage = AppError::from(DcaError::ConfigParse {
            path: PathBuf::from("config.yaml"),
            reason: "bad".into(),
        });
        assert_eq!(storage.status_and_code().1, "INTERNAL_ERROR");
    }

    #[test]
    fn validation_message_is_the_rule_text() {
        let err = AppError::from(ValidationError::TotalMismatch { total: 90.0 });
        assert_eq!(err.to_string(), "total allocation percentage must be 100%, got 90%");
    }
}

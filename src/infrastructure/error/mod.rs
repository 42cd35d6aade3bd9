use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

impl AppError {
    /// HTTP status and stable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST_BODY"),
            AppError::Template(e) => match e {
                TemplateError::NotFound(_) => (StatusCode::NOT_FOUND, "TEMPLATE_NOT_FOUND"),
                TemplateError::NameConflict(_) => (StatusCode::CONFLICT, "TEMPLATE_NAME_CONFLICT"),
                TemplateError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                TemplateError::SubstitutionTokenMismatch(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "SUBSTITUTION_TOKEN_MISMATCH",
                ),
                TemplateError::DuplicateId(_)
                | TemplateError::Timeout { .. }
                | TemplateError::Postgres(_)
                | TemplateError::Serialization(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
                }
            },
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let log_message = self.to_string();

        let client_message = match &self {
            // Don't leak serde's column/line details for malformed bodies
            AppError::InvalidBody(_) => "Invalid request body".to_string(),
            _ if status.is_server_error() && is_production() => {
                "An unexpected error occurred".to_string()
            }
            _ => log_message.clone(),
        };

        if status.is_server_error() {
            tracing::error!(
                code = %code,
                status = %status.as_u16(),
                message = %log_message,
                "API error"
            );
        } else {
            tracing::debug!(
                code = %code,
                status = %status.as_u16(),
                message = %log_message,
                "API request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

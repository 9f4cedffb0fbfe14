use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::store::StoreError;
use crate::utils::api_response::ApiResponse;
use crate::utils::credentials::CredentialError;
use crate::utils::validation::{FieldError, FieldErrors};
use crate::workflow::WorkflowError;

/// Every failure a handler can report, mapped onto one HTTP status each.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// A framework-level body rejection that keeps its own status (413, 415).
    #[error("{1}")]
    Rejected(StatusCode, String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Rejected(status, _) => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Validation(errors) => ApiResponse::error(
                status,
                "Validation error",
                Some(json!(errors)),
            )
            .into_response(),
            AppError::Internal(cause) => {
                error!("❌ Internal error: {}", cause);
                ApiResponse::error(status, "Internal server error", None).into_response()
            }
            other => ApiResponse::error(status, other.to_string(), None).into_response(),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors.into_inner())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => AppError::NotFound(format!("{entity} not found.")),
            StoreError::Conflict(message) => AppError::Conflict(message),
            StoreError::Database(e) => AppError::Internal(format!("database error: {e}")),
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::RoleNotAllowed(_) => AppError::Forbidden(err.to_string()),
            WorkflowError::RequestNotFound(_) => AppError::NotFound(err.to_string()),
            WorkflowError::DuplicateDecision { .. } => AppError::Conflict(err.to_string()),
            WorkflowError::StatusNotAllowed(_) => {
                let mut errors = FieldErrors::new();
                errors.push("status", err.to_string());
                AppError::from(errors)
            }
            WorkflowError::Store(store) => AppError::from(store),
        }
    }
}

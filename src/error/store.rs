use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;
use tracing::{debug, error};

use super::promptdesk::{ApiErrorBody, ApiErrorObject};

/// Failures surfaced by the template store.
///
/// Only `Unavailable` is an operational problem; the others describe bad input.
#[derive(Debug, Clone, ThisError, PartialEq, Eq)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No such template: {0}")]
    NotFound(String),

    #[error("A template named {0:?} already exists")]
    NameCollision(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::NameCollision(_) => StatusCode::CONFLICT,
            StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn body(&self) -> ApiErrorObject {
        let (code, message) = match self {
            StoreError::Validation(msg) => ("INVALID_REQUEST", msg.clone()),
            StoreError::NotFound(_) => ("NOT_FOUND", "No such template.".to_string()),
            StoreError::NameCollision(_) => (
                "NAME_COLLISION",
                "A template with that name already exists.".to_string(),
            ),
            StoreError::Unavailable(_) => (
                "STORE_UNAVAILABLE",
                "The template store is unavailable.".to_string(),
            ),
        };
        ApiErrorObject {
            code: code.to_string(),
            message,
            details: None,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            StoreError::Unavailable(reason) => {
                error!(status = %status, reason = %reason, "Template store unavailable");
            }
            other => {
                debug!(status = %status, error = %other, "Template store rejected request");
            }
        }
        (status, Json(ApiErrorBody { inner: self.body() })).into_response()
    }
}

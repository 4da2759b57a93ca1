use axum::{
    Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error as ThisError;

use super::store::StoreError;
use super::upstream::UpstreamError;

#[derive(Debug, ThisError)]
pub enum PromptdeskError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<JsonRejection> for PromptdeskError {
    fn from(rejection: JsonRejection) -> Self {
        PromptdeskError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for PromptdeskError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            PromptdeskError::Store(e) => return e.into_response(),
            PromptdeskError::Upstream(e) => return e.into_response(),

            PromptdeskError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "INVALID_REQUEST".to_string(),
                    message,
                    details: None,
                },
            ),

            e @ PromptdeskError::IoError(_) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorObject {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "An internal server error occurred.".to_string(),
                        details: None,
                    },
                )
            }
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Debug, Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

use super::promptdesk::{ApiErrorBody, ApiErrorObject};

/// Characters of an upstream error body kept for logs.
pub(crate) const UPSTREAM_BODY_PREVIEW_CHARS: usize = 500;

#[derive(Debug, ThisError)]
pub enum UpstreamError {
    /// Transport-level failure (DNS, connect, timeouts, etc).
    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body:.200}")]
    Status {
        status: StatusCode,
        /// Raw upstream body, for logs only.
        body: String,
    },

    #[error("Stream protocol error: {0}")]
    StreamProtocol(String),

    #[error("Stream idle timeout")]
    IdleTimeout,

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            UpstreamError::Status { status, body } => {
                tracing::warn!(
                    status = %status,
                    raw_body = %format!("{:.len$}", body, len = UPSTREAM_BODY_PREVIEW_CHARS),
                    "Model API returned an error"
                );
                let message = match *status {
                    StatusCode::TOO_MANY_REQUESTS => "Model API rate limit exceeded.",
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        "Model API rejected the configured credentials."
                    }
                    _ => "Model API returned an error.",
                };
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message)
            }
            UpstreamError::IdleTimeout => {
                tracing::warn!("Model API stream went idle");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "UPSTREAM_TIMEOUT",
                    "Model API stopped responding.",
                )
            }
            other => {
                tracing::error!(error = %other, "Model API call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "Model API call failed.",
                )
            }
        };

        let body = ApiErrorObject {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        };
        (status, Json(ApiErrorBody { inner: body })).into_response()
    }
}

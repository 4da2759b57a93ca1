use crate::error::PromptdeskError;
use crate::prompt::PromptFields;
use crate::server::router::PromptdeskState;
use crate::utils::logging::with_pretty_json_debug;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use tracing::debug;

pub mod respond;

/// POST /api/generate
///
/// Blank fields are filled from the stored config, the assembled messages are
/// sent to the model API and its deltas are relayed as SSE.
pub async fn generate(
    State(state): State<PromptdeskState>,
    payload: Result<Json<PromptFields>, JsonRejection>,
) -> Result<Response, PromptdeskError> {
    let Json(fields) = payload?;

    let defaults = state.store.get_config().await?;
    let messages = fields
        .with_defaults(&defaults)
        .into_messages()
        .ok_or_else(|| PromptdeskError::BadRequest("prompt is empty".to_string()))?;

    let body = state.chat.build_request(messages);
    with_pretty_json_debug(&body, |pretty_body| {
        debug!(
            channel = "chat",
            req.model = %body.model,
            body = %pretty_body,
            "[Chat] Assembled request body"
        );
    });

    let upstream_resp = state.chat.stream_chat(&body).await?;
    Ok(respond::build_stream_response(upstream_resp, state.chat.idle_timeout()).into_response())
}

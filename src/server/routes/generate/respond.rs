use crate::error::UpstreamError;
use axum::response::{
    IntoResponse,
    sse::{Event, KeepAlive, Sse},
};
use eventsource_stream::Eventsource;
use futures::{Stream, TryStreamExt};
use promptdesk_schema::{ChatCompletionChunk, ChatErrorBody};
use serde_json::json;
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::{debug, error};

/// What a single upstream SSE event turns into for the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StreamItem {
    Delta(String),
    Done,
}

impl StreamItem {
    fn into_event(self) -> Event {
        match self {
            StreamItem::Delta(text) => Event::default()
                .event("delta")
                .data(json!({ "text": text }).to_string()),
            StreamItem::Done => Event::default().event("done").data("[DONE]"),
        }
    }
}

/// Build the SSE response relaying upstream deltas.
pub(crate) fn build_stream_response(
    upstream_resp: reqwest::Response,
    idle_timeout: Duration,
) -> impl IntoResponse {
    let raw_stream = upstream_resp.bytes_stream().eventsource();
    let timed_stream = transform_stream(raw_stream)
        .timeout(idle_timeout)
        .map(move |item| match item {
            Ok(Ok(item)) => Ok(item.into_event()),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                error!(
                    "Model API SSE stream timed out (idle > {}s)",
                    idle_timeout.as_secs()
                );
                Err(UpstreamError::IdleTimeout)
            }
        });

    Sse::new(timed_stream).keep_alive(KeepAlive::default())
}

/// Convert upstream SSE events into relay items, dropping empty/role-only chunks.
pub(crate) fn transform_stream<I, E>(s: I) -> impl Stream<Item = Result<StreamItem, UpstreamError>>
where
    I: Stream<Item = Result<eventsource_stream::Event, E>>,
    E: std::fmt::Display,
{
    s.map_err(|e| UpstreamError::StreamProtocol(e.to_string()))
        .try_filter_map(|upstream_event| async move { translate(&upstream_event.data) })
}

fn translate(data: &str) -> Result<Option<StreamItem>, UpstreamError> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(None);
    }
    if data == "[DONE]" {
        return Ok(Some(StreamItem::Done));
    }

    if let Ok(err) = serde_json::from_str::<ChatErrorBody>(data) {
        let message = err
            .inner
            .message
            .unwrap_or_else(|| "upstream error event".to_string());
        return Err(UpstreamError::StreamProtocol(message));
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => Ok(chunk
            .delta_text()
            .map(|text| StreamItem::Delta(text.to_string()))),
        Err(e) => {
            debug!(error = %e, "Skipping non-JSON upstream event");
            Ok(None)
        }
    }
}

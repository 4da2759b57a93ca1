//! Client for the model API (OpenAI-compatible chat completions).

use crate::config::UpstreamConfig;
use crate::error::UpstreamError;
use promptdesk_schema::{ChatCompletionRequest, ChatMessage};
use reqwest::header::{ACCEPT, CONNECTION, HeaderMap, HeaderValue};
use std::time::{Duration, Instant};
use tracing::info;
use url::Url;

pub const PROMPTDESK_USER_AGENT: &str = concat!("promptdesk/", env!("CARGO_PKG_VERSION"));

/// Thin passthrough client: one POST per generation, no retries.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    url: Url,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    idle_timeout: Duration,
}

impl ChatClient {
    pub fn new(cfg: &UpstreamConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: build_client(cfg.proxy.clone(), cfg.enable_multiplexing)?,
            url: cfg.chat_completions_url()?,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            idle_timeout: Duration::from_secs(cfg.idle_timeout_secs.max(1)),
        })
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn build_request(&self, messages: Vec<ChatMessage>) -> ChatCompletionRequest {
        let mut body = ChatCompletionRequest::streaming(self.model.clone(), messages);
        body.temperature = self.temperature;
        body.max_tokens = self.max_tokens;
        body
    }

    /// Open a streaming completion. Non-2xx responses are turned into
    /// `UpstreamError::Status` with the body kept for logging.
    pub async fn stream_chat(
        &self,
        body: &ChatCompletionRequest,
    ) -> Result<reqwest::Response, UpstreamError> {
        let start = Instant::now();
        let mut request = self
            .client
            .post(self.url.clone())
            .header(ACCEPT, "text/event-stream")
            .json(body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        info!(
            channel = "chat",
            req.model = %body.model,
            req.messages = body.messages.len(),
            status = status.as_u16(),
            took_ms = start.elapsed().as_millis() as u64,
            "[Chat] Post chat/completions -> {}",
            body.model
        );

        if status.is_success() {
            return Ok(resp);
        }

        let body = match resp.text().await {
            Ok(text) => text,
            Err(e) => format!("<failed to read body: {e}>"),
        };
        Err(UpstreamError::Status { status, body })
    }
}

fn build_client(proxy: Option<Url>, enable_multiplexing: bool) -> Result<reqwest::Client, UpstreamError> {
    let mut headers = HeaderMap::new();

    // No overall timeout: streams may legitimately run for minutes; idle
    // detection happens on the event stream instead.
    let mut builder = reqwest::Client::builder()
        .user_agent(PROMPTDESK_USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(Duration::from_secs(10));

    if let Some(proxy_url) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }

    if !enable_multiplexing {
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        builder = builder
            .http1_only()
            .pool_max_idle_per_host(0)
            .pool_idle_timeout(Duration::from_secs(0));
    } else {
        builder = builder.http2_adaptive_window(true);
    }

    Ok(builder.default_headers(headers).build()?)
}

use crate::config::Config;
use crate::error::UpstreamError;
use crate::server::guards::session::RequireSession;
use crate::server::routes::{auth, config, generate, templates};
use crate::store::TemplateStore;
use crate::upstream::ChatClient;

use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, Version, header::USER_AGENT},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::extract::cookie::Key;
use base64::Engine as _;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rand::RngCore;
use reqwest::header::HeaderValue;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Instant;
use std::{sync::Arc, sync::LazyLock, time::Duration};
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

/// Global cookie encryption key for PrivateCookieJar; sessions end on restart.
static COOKIE_KEY: LazyLock<Key> = LazyLock::new(Key::generate);

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn generate_request_id() -> String {
    // 96 bits => 16 chars base64url (no padding).
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

#[derive(Clone)]
pub struct PromptdeskState {
    pub store: TemplateStore,
    pub chat: ChatClient,
    pub login_password: Arc<str>,
    pub insecure_cookie: bool,
    pub session_ttl: Duration,
    pub login_limiter: Arc<DefaultDirectRateLimiter>,
    pub static_dir: PathBuf,
}

impl PromptdeskState {
    pub fn new(store: TemplateStore, cfg: &Config) -> Result<Self, UpstreamError> {
        let chat = ChatClient::new(&cfg.upstream)?;

        let per_minute = NonZeroU32::new(cfg.basic.login_attempts_per_minute.max(1))
            .unwrap_or(NonZeroU32::MIN);
        let login_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            store,
            chat,
            login_password: Arc::from(cfg.basic.login_password.as_str()),
            insecure_cookie: cfg.basic.insecure_cookie,
            session_ttl: Duration::from_secs(u64::from(cfg.basic.session_ttl_hours.max(1)) * 3600),
            login_limiter,
            static_dir: cfg.basic.static_dir.clone(),
        })
    }
}

impl FromRef<PromptdeskState> for Key {
    fn from_ref(state: &PromptdeskState) -> Self {
        let _ = state; // state not used to fetch the static key
        COOKIE_KEY.clone()
    }
}

async fn access_log(req: Request, next: Next) -> Response {
    // Capture request metadata before moving `req` into the handler stack.
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(generate_request_id);

    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = start.elapsed().as_millis() as u64;
    let path = uri.path();
    let protocol = format_http_version(version);

    // For SSE responses `latency_ms` is time-to-first-byte, not stream duration.
    if status.is_server_error() {
        error!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else if status.is_client_error() {
        warn!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else {
        info!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    }

    resp
}

pub fn promptdesk_router(state: PromptdeskState) -> Router {
    let public = Router::new()
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route("/logout", post(auth::logout));

    let api = Router::new()
        .route(
            "/api/templates",
            get(templates::list_templates).post(templates::upsert_template),
        )
        .route("/api/templates:rename", post(templates::rename_template))
        .route(
            "/api/templates/{name}",
            get(templates::get_template).delete(templates::delete_template),
        )
        .route("/api/config", get(config::get_config))
        .route("/api/config/{key}", put(config::set_config))
        .route("/api/generate", post(generate::generate))
        .route_layer(middleware::from_extractor_with_state::<RequireSession, _>(
            state.clone(),
        ));

    // Static UI; the guard redirects browsers without a session to /login.
    let ui = Router::new()
        .fallback_service(ServeDir::new(&state.static_dir))
        .layer(middleware::from_extractor_with_state::<RequireSession, _>(
            state.clone(),
        ));

    Router::new()
        .merge(public)
        .merge(api)
        .merge(ui)
        .with_state(state)
        .layer(middleware::from_fn(access_log))
}


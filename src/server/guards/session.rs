use crate::server::router::PromptdeskState;
use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::Utc;
use serde_json::json;
use std::time::Duration;

pub const SESSION_COOKIE: &str = "promptdesk_session";

/// Guard for every route behind login. The session cookie is encrypted and
/// holds the unix timestamp it was issued at.
#[derive(Debug, Clone, Copy)]
pub struct RequireSession;

impl FromRequestParts<PromptdeskState> for RequireSession {
    type Rejection = SessionRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &PromptdeskState,
    ) -> Result<Self, Self::Rejection> {
        let jar = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };

        let issued_at = jar
            .get(SESSION_COOKIE)
            .and_then(|c| c.value().parse::<i64>().ok());

        match issued_at {
            Some(ts) if session_is_fresh(ts, Utc::now().timestamp(), state.session_ttl) => {
                Ok(RequireSession)
            }
            _ => Err(SessionRejection {
                api: parts.uri.path().starts_with("/api/"),
            }),
        }
    }
}

fn session_is_fresh(issued_at: i64, now: i64, ttl: Duration) -> bool {
    let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    // Small allowance for clock skew between issue and check.
    issued_at <= now + 60 && now.saturating_sub(issued_at) < ttl
}

pub fn session_cookie(issued_at: i64, insecure: bool, ttl: Duration) -> Cookie<'static> {
    let max_age = time::Duration::seconds(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX));
    Cookie::build((SESSION_COOKIE, issued_at.to_string()))
        .path("/")
        .http_only(true)
        .secure(!insecure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

pub struct SessionRejection {
    api: bool,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        if self.api {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": { "code": "UNAUTHORIZED", "message": "Login required." } })),
            )
                .into_response()
        } else {
            Redirect::to("/login").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_honours_ttl_and_skew() {
        let ttl = Duration::from_secs(3600);
        assert!(session_is_fresh(1_000, 1_000, ttl));
        assert!(session_is_fresh(1_000, 4_599, ttl));
        assert!(!session_is_fresh(1_000, 4_600, ttl));
        assert!(session_is_fresh(1_030, 1_000, ttl));
        assert!(!session_is_fresh(2_000, 1_000, ttl));
    }

    #[test]
    fn secure_flag_follows_config() {
        let ttl = Duration::from_secs(60);
        assert_eq!(session_cookie(1, false, ttl).secure(), Some(true));
        assert_eq!(session_cookie(1, true, ttl).secure(), Some(false));
        assert_eq!(session_cookie(1, true, ttl).http_only(), Some(true));
    }
}

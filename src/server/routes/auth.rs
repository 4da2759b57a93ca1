use crate::server::guards::session::{expired_session_cookie, session_cookie};
use crate::server::router::PromptdeskState;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use chrono::Utc;
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

const LOGIN_PAGE: &str = include_str!("../../../assets/login.html");
const ERROR_PLACEHOLDER: &str = "<!--login-error-->";

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

/// GET /login
pub async fn login_page(Query(query): Query<LoginQuery>) -> Html<String> {
    let notice = if query.error.is_some() {
        r#"<p class="error">Wrong password.</p>"#
    } else {
        ""
    };
    Html(LOGIN_PAGE.replace(ERROR_PLACEHOLDER, notice))
}

/// POST /login
pub async fn login_submit(
    State(state): State<PromptdeskState>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if state.login_limiter.check().is_err() {
        warn!("Login rate limit exceeded");
        return (StatusCode::TOO_MANY_REQUESTS, "Too many login attempts, retry shortly.")
            .into_response();
    }

    if !password_matches(&form.password, &state.login_password) {
        warn!("Login rejected: wrong password");
        return Redirect::to("/login?error=1").into_response();
    }

    let jar = jar.add(session_cookie(
        Utc::now().timestamp(),
        state.insecure_cookie,
        state.session_ttl,
    ));
    info!("Login accepted");
    (jar, Redirect::to("/")).into_response()
}

/// POST /logout
pub async fn logout(jar: PrivateCookieJar) -> impl IntoResponse {
    (jar.remove(expired_session_cookie()), Redirect::to("/login"))
}

fn password_matches(given: &str, expected: &str) -> bool {
    // An empty configured password never matches.
    !expected.is_empty() && bool::from(given.as_bytes().ct_eq(expected.as_bytes()))
}

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use promptdesk::config::Config;
use promptdesk::server::{PromptdeskState, promptdesk_router};
use promptdesk::store::TemplateStore;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

const PASSWORD: &str = "correct horse";

struct TestApp {
    router: Router,
    root: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

async fn build_app(tag: &str, login_attempts_per_minute: u32) -> TestApp {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut root = std::env::temp_dir();
    root.push(format!(
        "promptdesk-route-{tag}-{}-{}",
        std::process::id(),
        nanos
    ));
    let static_dir = root.join("public");
    std::fs::create_dir_all(&static_dir).unwrap();
    std::fs::write(static_dir.join("index.html"), "<html>prompt desk</html>").unwrap();

    let mut cfg = Config::default();
    cfg.basic.login_password = PASSWORD.to_string();
    cfg.basic.insecure_cookie = true;
    cfg.basic.login_attempts_per_minute = login_attempts_per_minute;
    cfg.basic.static_dir = static_dir;

    let db_url = format!("sqlite:{}", root.join("store.sqlite").display());
    let store = TemplateStore::open(&db_url, 16).await.unwrap();
    let state = PromptdeskState::new(store, &cfg).unwrap();

    TestApp {
        router: promptdesk_router(state),
        root,
    }
}

fn login_request(password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("password={}", password.replace(' ', "+"))))
        .unwrap()
}

async fn login(app: &TestApp) -> String {
    let resp = app
        .router
        .clone()
        .oneshot(login_request(PASSWORD))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/");

    let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("promptdesk_session="));
    assert!(set_cookie.contains("HttpOnly"));
    set_cookie.split(';').next().unwrap().to_string()
}

fn json_request(method: &str, uri: &str, cookie: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn names(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn api_without_session_is_unauthorized() {
    let app = build_app("unauth-api", 10).await;

    let resp = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/templates")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key("x-request-id"));

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn ui_without_session_redirects_to_login() {
    let app = build_app("unauth-ui", 10).await;

    let resp = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/login");

    let resp = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_redirects_back_with_error() {
    let app = build_app("wrong-pw", 10).await;

    let resp = app
        .router
        .clone()
        .oneshot(login_request("nope"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/login?error=1");
    assert!(!resp.headers().contains_key(header::SET_COOKIE));

    let resp = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/login?error=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("Wrong password."));
}

#[tokio::test]
async fn login_attempts_are_rate_limited() {
    let app = build_app("rate-limit", 1).await;

    let first = app
        .router
        .clone()
        .oneshot(login_request("nope"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::SEE_OTHER);

    let second = app
        .router
        .clone()
        .oneshot(login_request(PASSWORD))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn session_unlocks_ui_and_api() {
    let app = build_app("session", 10).await;
    let cookie = login(&app).await;

    let resp = app
        .router
        .clone()
        .oneshot(json_request("GET", "/", &cookie, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("prompt desk"));

    let (status, body) = send(&app, json_request("GET", "/api/templates", &cookie, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn template_lifecycle_over_http() {
    let app = build_app("lifecycle", 10).await;
    let cookie = login(&app).await;

    // 1. Create
    let (status, list) = send(
        &app,
        json_request(
            "POST",
            "/api/templates",
            &cookie,
            Some(json!({"name": "Landing A", "data": {"structure": "S1"}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&list), vec!["Landing A"]);
    assert_eq!(list[0]["data"], json!({"structure": "S1"}));
    let created_at = list[0]["createdAt"].clone();
    assert!(created_at.is_string());

    // 2. Fetch one
    let (status, one) = send(
        &app,
        json_request("GET", "/api/templates/Landing%20A", &cookie, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["name"], "Landing A");

    // 3. Rename + replace data
    let (status, list) = send(
        &app,
        json_request(
            "POST",
            "/api/templates:rename",
            &cookie,
            Some(json!({"oldName": "Landing A", "newName": "Landing B", "data": {"structure": "S2"}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&list), vec!["Landing B"]);
    assert_eq!(list[0]["data"], json!({"structure": "S2"}));
    assert_eq!(list[0]["createdAt"], created_at);

    // 4. Old name is gone
    let (status, body) = send(
        &app,
        json_request("GET", "/api/templates/Landing%20A", &cookie, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    // 5. Delete, then delete again
    for _ in 0..2 {
        let (status, list) = send(
            &app,
            json_request("DELETE", "/api/templates/Landing%20B", &cookie, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list, json!([]));
    }
}

#[tokio::test]
async fn rename_errors_map_to_status_codes() {
    let app = build_app("rename-errors", 10).await;
    let cookie = login(&app).await;

    for name in ["A", "B"] {
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/templates",
                &cookie,
                Some(json!({"name": name, "data": {}})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/templates:rename",
            &cookie,
            Some(json!({"oldName": "A", "newName": "B", "data": {"structure": "x"}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({"error": {"code": "NAME_COLLISION", "message": "A template with that name already exists."}})
    );

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/templates:rename",
            &cookie,
            Some(json!({"oldName": "ghost", "newName": "C", "data": {}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/templates",
            &cookie,
            Some(json!({"name": "  ", "data": {}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");

    // Missing `data`
    let (status, body) = send(
        &app,
        json_request("POST", "/api/templates", &cookie, Some(json!({"name": "C"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");

    let (_, list) = send(&app, json_request("GET", "/api/templates", &cookie, None)).await;
    assert_eq!(names(&list), vec!["B", "A"]);
}

#[tokio::test]
async fn config_entries_round_trip() {
    let app = build_app("config", 10).await;
    let cookie = login(&app).await;

    let (status, body) = send(&app, json_request("GET", "/api/config", &cookie, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/config/systemPrompt",
            &cookie,
            Some(json!({"value": "X"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, json_request("GET", "/api/config", &cookie, None)).await;
    assert_eq!(body, json!({"systemPrompt": "X"}));
}

#[tokio::test]
async fn generate_with_nothing_to_ask_is_rejected() {
    let app = build_app("generate-empty", 10).await;
    let cookie = login(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/generate",
            &cookie,
            Some(json!({"systemPrompt": "only a system prompt"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn logout_clears_session_cookie() {
    let app = build_app("logout", 10).await;
    let cookie = login(&app).await;

    let resp = app
        .router
        .clone()
        .oneshot(json_request("POST", "/logout", &cookie, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/login");
    let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("promptdesk_session="));
}

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use tokenpair_server::auth::{SecretHasher, TokenCodec};
use tokenpair_server::server::{AppState, ProxyPolicy, build_router};
use tokenpair_server::session::SessionService;
use tokenpair_server::storage::AuthDatabase;

const GUID: &str = "4c0c9a8e-7a2b-4d8e-9f3c-1b2a3c4d5e6f";
const IP: &str = "203.0.113.7";
const UA: &str = "curl/8.0";
const SIGNING_SECRET: &[u8] = b"integration-secret";

async fn app_with(proxy: ProxyPolicy) -> (axum::Router, Arc<SessionService>) {
    let db = AuthDatabase::open_in_memory().await.unwrap();
    db.create_user(GUID).await.unwrap();

    let sessions = Arc::new(SessionService::new(
        db,
        TokenCodec::new(SIGNING_SECRET),
        SecretHasher::with_cost(64, 1, 1).unwrap(),
        None,
    ));
    let router = build_router(AppState {
        sessions: Arc::clone(&sessions),
        proxy,
    });
    (router, sessions)
}

async fn app() -> axum::Router {
    app_with(ProxyPolicy {
        trust_forwarded_for: true,
    })
    .await
    .0
}

/// Send a request and return (status, JSON body).
async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    match body {
        Some(json) => {
            send_raw(
                app,
                method,
                uri,
                headers,
                Some("application/json"),
                &json.to_string(),
            )
            .await
        }
        None => send_raw(app, method, uri, headers, None, "").await,
    }
}

/// Send a request with a literal body and optional content type.
async fn send_raw(
    app: &axum::Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for &(name, value) in headers {
        builder = builder.header(name, value);
    }
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    let body = Body::from(body.to_string());

    let resp = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn issue(app: &axum::Router) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/auth/token",
        &[("x-forwarded-for", IP), ("user-agent", UA)],
        Some(json!({ "guid": GUID })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[tokio::test]
async fn health_reports_name_and_version() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/health", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "tokenpair-server");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn issue_then_me() {
    let app = app().await;
    let (access, _) = issue(&app).await;

    let (status, body) = send(
        &app,
        "GET",
        "/auth/me",
        &[("authorization", &bearer(&access))],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["guid"], GUID);
}

#[tokio::test]
async fn issue_error_statuses() {
    let app = app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/token",
        &[],
        Some(json!({ "guid": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/auth/token",
        &[],
        Some(json!({ "guid": "00000000-0000-4000-8000-000000000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn me_requires_bearer() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/auth/me", &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        "GET",
        "/auth/me",
        &[("authorization", "Bearer garbage")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rotates_and_old_pair_stops_working() {
    let app = app().await;
    let (access, refresh) = issue(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/refresh",
        &[
            ("authorization", &bearer(&access)),
            ("x-forwarded-for", IP),
            ("user-agent", UA),
        ],
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let new_access = body["access_token"].as_str().unwrap().to_string();
    assert_ne!(new_access, access);

    let (status, _) = send(
        &app,
        "GET",
        "/auth/me",
        &[("authorization", &bearer(&access))],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "GET",
        "/auth/me",
        &[("authorization", &bearer(&new_access))],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["guid"], GUID);
}

#[tokio::test]
async fn refresh_with_bad_refresh_token_is_bad_request() {
    let app = app().await;
    let (access, _) = issue(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/auth/refresh",
        &[
            ("authorization", &bearer(&access)),
            ("x-forwarded-for", IP),
            ("user-agent", UA),
        ],
        Some(json!({ "refresh_token": "%%%" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_from_other_device_is_unauthorized_and_revokes() {
    let app = app().await;
    let (access, refresh) = issue(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/auth/refresh",
        &[
            ("authorization", &bearer(&access)),
            ("x-forwarded-for", IP),
            ("user-agent", "Mozilla/5.0"),
        ],
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "GET",
        "/auth/me",
        &[("authorization", &bearer(&access))],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_from_new_address_succeeds() {
    let app = app().await;
    let (access, refresh) = issue(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/auth/refresh",
        &[
            ("authorization", &bearer(&access)),
            ("x-forwarded-for", "198.51.100.1"),
            ("user-agent", UA),
        ],
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_revokes_and_repeats_cleanly() {
    let app = app().await;
    let (access, _) = issue(&app).await;
    let auth = bearer(&access);

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            "POST",
            "/auth/logout",
            &[("authorization", &auth)],
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());
    }

    let (status, _) = send(&app, "GET", "/auth/me", &[("authorization", &auth)], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn issue_with_missing_field_is_bad_request() {
    let app = app().await;

    let (status, body) = send(&app, "POST", "/auth/token", &[], Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("guid"), "{body}");
}

#[tokio::test]
async fn issue_with_non_json_body_is_bad_request() {
    let app = app().await;

    let (status, body) = send_raw(
        &app,
        "POST",
        "/auth/token",
        &[],
        Some("application/json"),
        "guid=4c0c9a8e",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send_raw(&app, "POST", "/auth/token", &[], None, "plain text").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn refresh_with_bad_body_is_bad_request() {
    let app = app().await;
    let (access, _) = issue(&app).await;
    let auth = bearer(&access);
    let headers = [
        ("authorization", auth.as_str()),
        ("x-forwarded-for", IP),
        ("user-agent", UA),
    ];

    let (status, body) = send(&app, "POST", "/auth/refresh", &headers, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("refresh_token"), "{body}");

    let (status, body) = send_raw(
        &app,
        "POST",
        "/auth/refresh",
        &headers,
        Some("application/json"),
        "{not json",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    // The session was not consumed by the rejected requests.
    let (status, _) = send(&app, "GET", "/auth/me", &[("authorization", &auth)], None).await;
    assert_eq!(status, StatusCode::OK);
}

async fn bound_address(proxy: ProxyPolicy) -> String {
    let (app, sessions) = app_with(proxy).await;
    let (access, _) = issue(&app).await;

    let session_id = TokenCodec::new(SIGNING_SECRET)
        .parse_access_token(&access)
        .unwrap()
        .jti;
    let session = sessions.db().get_session(&session_id).await.unwrap().unwrap();
    session.ip
}

#[tokio::test]
async fn forwarded_for_is_bound_only_when_trusted() {
    let trusted = bound_address(ProxyPolicy {
        trust_forwarded_for: true,
    })
    .await;
    assert_eq!(trusted, IP);

    let direct = bound_address(ProxyPolicy::default()).await;
    assert_eq!(direct, "unknown");
}

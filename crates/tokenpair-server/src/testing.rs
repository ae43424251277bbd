//! Shared helpers for unit tests.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

pub type Captured = Arc<Mutex<Vec<serde_json::Value>>>;

/// Start a local webhook that records JSON bodies and answers with `status`.
///
/// Returns the webhook URL and the recorded bodies.
pub async fn capture_server(status: StatusCode) -> (String, Captured) {
    let captured: Captured = Arc::default();
    let app = Router::new()
        .route(
            "/webhook",
            post(
                move |State(store): State<Captured>, Json(body): Json<serde_json::Value>| async move {
                    store.lock().unwrap().push(body);
                    status
                },
            ),
        )
        .with_state(Arc::clone(&captured));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/webhook"), captured)
}

use std::sync::Arc;

use axum::extract::{FromRef, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::extract::{BearerToken, ClientMeta, JsonBody, ProxyPolicy};
use crate::session::{SessionService, TokenPair};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub proxy: ProxyPolicy,
}

impl FromRef<AppState> for ProxyPolicy {
    fn from_ref(state: &AppState) -> Self {
        state.proxy
    }
}

#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    pub guid: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub guid: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub name: &'static str,
    pub version: &'static str,
}

/// `POST /auth/token`
pub async fn issue(
    State(state): State<AppState>,
    client: ClientMeta,
    JsonBody(req): JsonBody<IssueRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let pair = state
        .sessions
        .issue(&req.guid, &client.ip, &client.user_agent)
        .await?;
    Ok(Json(pair.into()))
}

/// `POST /auth/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    client: ClientMeta,
    BearerToken(access_token): BearerToken,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let pair = state
        .sessions
        .refresh(
            &access_token,
            &req.refresh_token,
            &client.ip,
            &client.user_agent,
        )
        .await?;
    Ok(Json(pair.into()))
}

/// `GET /auth/me`
pub async fn who_am_i(
    State(state): State<AppState>,
    BearerToken(access_token): BearerToken,
) -> Result<Json<WhoAmIResponse>, ApiError> {
    let guid = state.sessions.who_am_i(&access_token).await?;
    Ok(Json(WhoAmIResponse { guid }))
}

/// `POST /auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(access_token): BearerToken,
) -> Result<Json<MessageResponse>, ApiError> {
    state.sessions.logout(&access_token).await?;
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the axum router with all routes and tracing middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/auth/token", post(issue))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(who_am_i))
        .route("/auth/logout", post(logout))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

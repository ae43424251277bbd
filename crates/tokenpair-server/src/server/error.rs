//! Mapping of protocol failures onto HTTP responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::session::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing or malformed bearer token")]
    MissingBearer,

    /// Body was not JSON or did not match the request shape.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingBearer => StatusCode::UNAUTHORIZED,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Auth(e) => match e {
                AuthError::InvalidIdentity | AuthError::InvalidRefreshToken => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::IdentityNotFound => StatusCode::NOT_FOUND,
                AuthError::InvalidAccessToken | AuthError::WrongUserAgent => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::NotUnique => StatusCode::CONFLICT,
                AuthError::TokenGenerationFailed | AuthError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use tokenpair_core::db::DatabaseError;

    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (ApiError::MissingBearer, StatusCode::UNAUTHORIZED),
            (
                ApiError::InvalidBody("missing field `guid`".into()),
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::InvalidIdentity.into(), StatusCode::BAD_REQUEST),
            (AuthError::IdentityNotFound.into(), StatusCode::NOT_FOUND),
            (AuthError::InvalidAccessToken.into(), StatusCode::UNAUTHORIZED),
            (AuthError::InvalidRefreshToken.into(), StatusCode::BAD_REQUEST),
            (AuthError::WrongUserAgent.into(), StatusCode::UNAUTHORIZED),
            (AuthError::NotUnique.into(), StatusCode::CONFLICT),
            (
                AuthError::TokenGenerationFailed.into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthError::Storage(DatabaseError::Query("boom".into())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }
    }

    #[tokio::test]
    async fn client_errors_render_message() {
        let resp = ApiError::InvalidBody("missing field `guid`".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("guid"));
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let err: ApiError = AuthError::Storage(DatabaseError::Query("secret detail".into())).into();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }
}

//! Request extractors for client binding data and bearer credentials.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, FromRef, FromRequest, FromRequestParts, Request};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// Placeholder address when neither a proxy header nor the socket peer is known.
pub const UNKNOWN_ADDR: &str = "unknown";

/// Which request data may be used to identify the client address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyPolicy {
    /// Honour `X-Forwarded-For`. Off unless a proxy rewrites the header.
    pub trust_forwarded_for: bool,
}

/// Network address and user agent a session gets bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMeta {
    pub ip: String,
    pub user_agent: String,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// First hop of `X-Forwarded-For`, if present and non-empty.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for ClientMeta
where
    ProxyPolicy: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let policy = ProxyPolicy::from_ref(state);
        let ip = policy
            .trust_forwarded_for
            .then(|| forwarded_for(&parts.headers))
            .flatten()
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| UNKNOWN_ADDR.to_string());

        let user_agent = header_str(&parts.headers, "user-agent")
            .unwrap_or_default()
            .to_string();

        Ok(Self { ip, user_agent })
    }
}

/// Token from an `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_str(&parts.headers, "authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self(token.to_string()))
            .ok_or(ApiError::MissingBearer)
    }
}

/// `Json` whose rejections render as [`ApiError::InvalidBody`].
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

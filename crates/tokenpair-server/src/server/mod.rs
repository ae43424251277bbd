//! HTTP transport for the session protocol.

pub mod error;
pub mod extract;
pub mod routes;

pub use error::ApiError;
pub use extract::ProxyPolicy;
pub use routes::{AppState, build_router};

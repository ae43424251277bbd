//! Failure kinds of the session protocol.

use tokenpair_core::db::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Identity is not a valid GUID")]
    InvalidIdentity,

    #[error("Identity not found")]
    IdentityNotFound,

    #[error("Invalid access token")]
    InvalidAccessToken,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// The session was revoked as a side effect.
    #[error("User agent does not match the session")]
    WrongUserAgent,

    #[error("Session id already in use")]
    NotUnique,

    #[error("Failed to generate token material")]
    TokenGenerationFailed,

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

//! Token codec for tokenpair.
//!
//! Access token signing/parsing, refresh-secret generation and hashing.

pub mod claims;
pub mod jwt;
pub mod secret;

pub use claims::AccessClaims;
pub use jwt::TokenCodec;
pub use secret::{
    REFRESH_SECRET_LEN, RefreshSecret, SecretHasher, decode_refresh_token, encode_refresh_token,
    generate_refresh_secret, generate_session_id,
};

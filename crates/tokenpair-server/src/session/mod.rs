//! Session rotation protocol.
//!
//! [`SessionService`] issues token pairs, rotates them on refresh while
//! enforcing the user-agent binding, and revokes them on logout.

mod error;
mod service;


pub use error::AuthError;
pub use service::{RotationOutcome, SessionService, TokenPair};

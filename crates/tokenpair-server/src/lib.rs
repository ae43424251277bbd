//! tokenpair server library
//!
//! - Access-token signing and refresh-secret hashing
//! - SQLite storage for users and refresh sessions
//! - Session rotation protocol with user-agent binding
//! - Address-change webhook notifications
//! - axum HTTP routes

pub mod auth;
pub mod notifications;
pub mod server;
pub mod session;
pub mod storage;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod testing;

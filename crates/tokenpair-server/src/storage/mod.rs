//! SQLite storage for the tokenpair server.
//!
//! Persists provisioned users and their refresh sessions.

mod db;
mod models;
mod queries;


pub use db::AuthDatabase;
pub use models::*;
pub use tokenpair_core::db::DatabaseError;

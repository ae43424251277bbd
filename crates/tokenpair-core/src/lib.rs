//! `tokenpair` Core Library
//!
//! Shared functionality for `tokenpair` components:
//! - Configuration resolution and hierarchy
//! - `SQLite` pool helpers and storage error classification
//! - Tracing subscriber setup
//! - Common error types

pub mod config;
pub mod db;
pub mod error;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};

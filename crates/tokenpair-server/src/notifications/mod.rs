//! Address-change notifications.
//!
//! When a refresh arrives from a different network address than the one the
//! session was bound to, an [`AddressChange`] is posted to a webhook.

pub mod webhook;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use webhook::WebhookNotifier;

/// Errors that can occur while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The HTTP client could not be constructed.
    #[error("Webhook client error: {0}")]
    Client(String),

    /// HTTP request to the webhook failed.
    #[error("Webhook request error: {0}")]
    Request(String),

    /// The webhook returned a non-success status code.
    #[error("Webhook error (status {status}): {body}")]
    Api {
        /// HTTP status code returned by the webhook.
        status: u16,
        /// Response body from the webhook.
        body: String,
    },
}

/// A refresh was presented from a new network address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressChange {
    pub guid: String,
    pub old_ip: String,
    pub new_ip: String,
    /// Serialized as RFC 3339.
    pub timestamp: DateTime<Utc>,
}

impl AddressChange {
    pub fn now(guid: &str, old_ip: &str, new_ip: &str) -> Self {
        Self {
            guid: guid.to_string(),
            old_ip: old_ip.to_string(),
            new_ip: new_ip.to_string(),
            timestamp: Utc::now(),
        }
    }
}

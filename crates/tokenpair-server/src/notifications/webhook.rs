//! Webhook client for address-change events.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{AddressChange, NotificationError};

/// Posts [`AddressChange`] events as JSON to a fixed URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Build a notifier whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Client` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotificationError> {
        // No-op if a provider is already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::Client(e.to_string()))?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver one event and wait for the response.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Request` if the HTTP request fails, or
    /// `NotificationError::Api` if the webhook returns a non-2xx status code.
    pub async fn send(&self, event: &AddressChange) -> Result<(), NotificationError> {
        let response = self
            .http
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(|e| NotificationError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(guid = %event.guid, "Address change delivered");
            Ok(())
        } else {
            let status_code = status.as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            Err(NotificationError::Api {
                status: status_code,
                body,
            })
        }
    }

    /// Deliver an event in the background. Failures are logged and dropped.
    pub fn dispatch(&self, event: AddressChange) -> JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&event).await {
                warn!(
                    error = %e,
                    url = %notifier.url,
                    guid = %event.guid,
                    "Failed to deliver address change notification"
                );
            }
        })
    }
}

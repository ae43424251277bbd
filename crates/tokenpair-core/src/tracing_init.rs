//! Tracing/logging initialization.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Error, Result};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "tokenpair_server=info,tokenpair_core=info,tower_http=info";

/// Build the env filter, preferring `RUST_LOG` over `default_filter`.
fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install the global tracing subscriber.
///
/// `log_json` switches the fmt layer to one JSON object per line for log
/// aggregation. Fails if a global subscriber is already set.
pub fn init_tracing(default_filter: &str, log_json: bool) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(default_filter));

    let installed = if log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    installed.map_err(|e| Error::Tracing(e.to_string()))
}

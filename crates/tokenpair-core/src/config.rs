//! Configuration resolution for tokenpair.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`~/.config/tokenpair/settings.json`)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables
//! 5. CLI arguments (applied by the binary, highest priority)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Signing secret used when nothing else is configured. Only suitable for
/// local development.
pub const DEFAULT_SIGNING_SECRET: &str = "secrets";

/// Complete tokenpair configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Take the client address from `X-Forwarded-For`. Only safe behind a
    /// proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            trust_forwarded_for: false,
        }
    }
}

/// Token signing and refresh-secret hashing.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC key for access tokens.
    pub signing_secret: String,
    /// argon2 memory cost in KiB.
    pub hash_memory_kib: u32,
    /// argon2 iteration count.
    pub hash_iterations: u32,
    /// argon2 lanes.
    pub hash_parallelism: u32,
}

impl AuthConfig {
    pub fn uses_default_secret(&self) -> bool {
        self.signing_secret == DEFAULT_SIGNING_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_secret: DEFAULT_SIGNING_SECRET.to_string(),
            // argon2id defaults recommended by OWASP (19 MiB, t=2, p=1)
            hash_memory_kib: 19 * 1024,
            hash_iterations: 2,
            hash_parallelism: 1,
        }
    }
}

// Hand-written so the signing secret never reaches logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_secret", &"<redacted>")
            .field("hash_memory_kib", &self.hash_memory_kib)
            .field("hash_iterations", &self.hash_iterations)
            .field("hash_parallelism", &self.hash_parallelism)
            .finish()
    }
}

/// Address-change webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Endpoint receiving address-change events. `None` disables delivery.
    pub url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: Some("http://localhost:9090/webhook".to_string()),
            timeout_secs: 5,
        }
    }
}

/// Session store location and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `SQLite` database file. `None` resolves to [`database_path`].
    pub database_path: Option<PathBuf>,
    /// `SQLite` busy timeout in seconds.
    pub busy_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout_secs: 5,
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut layers = Vec::new();

    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            layers.push(global_path);
        }
    }

    if let Some(path) = explicit {
        // An explicitly requested file must exist.
        layers.push(path.to_path_buf());
    }

    let mut config = layer_config_files(&layers)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("tokenpair").join("settings.json"))
}

/// Default location of the session database.
pub fn database_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tokenpair").join("auth.db"))
}

#[cfg(target_os = "linux")]
fn config_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
}

#[cfg(not(target_os = "linux"))]
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir()
}

/// Overlay each file on the defaults in order. Later files only replace
/// the keys they actually contain.
fn layer_config_files(paths: &[PathBuf]) -> Result<Config> {
    let mut merged = serde_json::to_value(Config::default())?;
    for path in paths {
        merge_config(&mut merged, load_config_file(path)?);
    }
    Ok(serde_json::from_value(merged)?)
}

fn load_config_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;

    // Reject wrongly typed fields here, while the file name is still known.
    Config::deserialize(&value).map_err(|e| {
        Error::Config(format!("Invalid config file {}: {}", path.display(), e))
    })?;
    Ok(value)
}

/// Deep-merge `overlay` into `base`. Objects merge key by key; any other
/// value, `null` included, replaces what was there.
fn merge_config(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_config(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Apply `TOKENPAIR_*` variables. `lookup` is injected so tests do not touch
/// the process environment.
fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(val) = lookup("TOKENPAIR_ADDR") {
        config.server.addr = val;
    }
    if let Some(val) = lookup("TOKENPAIR_TRUST_FORWARDED_FOR") {
        config.server.trust_forwarded_for = parse_env("TOKENPAIR_TRUST_FORWARDED_FOR", &val)?;
    }
    if let Some(val) = lookup("TOKENPAIR_SIGNING_SECRET") {
        config.auth.signing_secret = val;
    }
    if let Some(val) = lookup("TOKENPAIR_HASH_MEMORY_KIB") {
        config.auth.hash_memory_kib = parse_env("TOKENPAIR_HASH_MEMORY_KIB", &val)?;
    }
    if let Some(val) = lookup("TOKENPAIR_WEBHOOK_URL") {
        // An empty value switches delivery off.
        config.webhook.url = if val.is_empty() { None } else { Some(val) };
    }
    if let Some(val) = lookup("TOKENPAIR_WEBHOOK_TIMEOUT_SECS") {
        config.webhook.timeout_secs = parse_env("TOKENPAIR_WEBHOOK_TIMEOUT_SECS", &val)?;
    }
    if let Some(val) = lookup("TOKENPAIR_DB_PATH") {
        config.storage.database_path = Some(PathBuf::from(val));
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{key} has an invalid value: {value}")))
}

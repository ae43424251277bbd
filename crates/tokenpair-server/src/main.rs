//! tokenpair server
//!
//! HTTP service issuing and rotating access/refresh token pairs.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use tokenpair_core::config::{self, Config};
use tokenpair_core::db::PoolSettings;
use tokenpair_core::tracing_init::{DEFAULT_FILTER, init_tracing};

use tokenpair_server::auth::{SecretHasher, TokenCodec};
use tokenpair_server::notifications::WebhookNotifier;
use tokenpair_server::server::{AppState, ProxyPolicy, build_router};
use tokenpair_server::session::SessionService;
use tokenpair_server::storage::{AuthDatabase, DatabaseError};

#[derive(Parser, Debug)]
#[command(name = "tokenpair-server")]
#[command(
    version,
    about = "tokenpair server - access/refresh token issuance and rotation"
)]
struct Args {
    /// Path to a JSON config file.
    #[arg(long, global = true, env = "TOKENPAIR_CONFIG")]
    config: Option<PathBuf>,

    /// Path to SQLite database file.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve(ServeArgs),

    /// Register a user GUID so tokens can be issued for it.
    AddUser {
        #[arg(long)]
        guid: String,
    },
}

#[derive(clap::Args, Debug, Default)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long)]
    addr: Option<String>,

    /// HMAC secret for signing access tokens.
    #[arg(long)]
    signing_secret: Option<String>,

    /// URL receiving address-change notifications. Empty disables them.
    #[arg(long)]
    webhook_url: Option<String>,

    /// Bind sessions to the first `X-Forwarded-For` hop (behind a proxy only).
    #[arg(long)]
    trust_forwarded_for: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(DEFAULT_FILTER, args.log_json)?;

    let mut config = config::load_config(args.config.as_deref())?;
    if let Some(path) = args.db_path {
        config.storage.database_path = Some(path);
    }

    match args.command {
        Some(Command::AddUser { guid }) => add_user(&config, &guid).await,
        Some(Command::Serve(serve_args)) => serve(config, serve_args).await,
        None => serve(config, ServeArgs::default()).await,
    }
}

async fn open_database(config: &Config) -> anyhow::Result<AuthDatabase> {
    let path = match &config.storage.database_path {
        Some(path) => path.clone(),
        None => config::database_path().context("Cannot determine data directory")?,
    };
    info!(path = %path.display(), "Opening auth database");

    let settings = PoolSettings {
        busy_timeout: Duration::from_secs(config.storage.busy_timeout_secs),
        ..PoolSettings::default()
    };
    Ok(AuthDatabase::open(&path, settings).await?)
}

async fn add_user(config: &Config, guid: &str) -> anyhow::Result<()> {
    uuid::Uuid::parse_str(guid).with_context(|| format!("Not a valid GUID: {guid}"))?;

    let db = open_database(config).await?;
    match db.create_user(guid).await {
        Ok(user) => {
            info!(guid = %user.guid, "User added");
            Ok(())
        }
        Err(DatabaseError::Conflict(_)) => {
            warn!(guid, "User already exists");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn serve(mut config: Config, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(secret) = args.signing_secret {
        config.auth.signing_secret = secret;
    }
    if let Some(url) = args.webhook_url {
        config.webhook.url = (!url.is_empty()).then_some(url);
    }
    if args.trust_forwarded_for {
        config.server.trust_forwarded_for = true;
    }

    let addr: SocketAddr = config
        .server
        .addr
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.addr))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %addr,
        "Starting tokenpair-server"
    );

    if config.auth.uses_default_secret() {
        warn!("Using the built-in signing secret; set TOKENPAIR_SIGNING_SECRET in production");
    }

    let db = open_database(&config).await?;
    let codec = TokenCodec::new(config.auth.signing_secret.as_bytes());
    let hasher = SecretHasher::with_cost(
        config.auth.hash_memory_kib,
        config.auth.hash_iterations,
        config.auth.hash_parallelism,
    )
    .map_err(|e| anyhow::anyhow!("Invalid argon2 parameters: {e}"))?;

    let notifier = match &config.webhook.url {
        Some(url) => {
            info!(url = %url, "Address-change webhook enabled");
            Some(WebhookNotifier::new(
                url.clone(),
                Duration::from_secs(config.webhook.timeout_secs),
            )?)
        }
        None => {
            info!("Address-change webhook disabled");
            None
        }
    };

    let sessions = Arc::new(SessionService::new(db, codec, hasher, notifier));
    let proxy = ProxyPolicy {
        trust_forwarded_for: config.server.trust_forwarded_for,
    };
    if proxy.trust_forwarded_for {
        info!("Client addresses taken from X-Forwarded-For");
    }
    let app = build_router(AppState { sessions, proxy });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

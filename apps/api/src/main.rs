//! # StoreHub API
//!
//! REST server for the StoreHub back office.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tracing ──► config ──► SQLite (+ migrations) ──► bootstrap admin      │
//! │                                                         │               │
//! │                                   axum::serve (graceful shutdown) ◄─┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use storehub_api::auth::bootstrap_admin;
use storehub_api::server::{self, AppState};
use storehub_api::AppConfig;
use storehub_db::{Database, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting StoreHub API server...");

    let config = AppConfig::load().context("loading configuration")?;
    info!(
        bind_addr = %config.server.bind_addr,
        database = %config.database.path,
        email_provider = ?config.email.provider,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database.path).max_connections(config.database.max_connections),
    )
    .await
    .context("opening database")?;
    info!("Database ready");

    if let Some(admin) = bootstrap_admin(&db, &config.auth)
        .await
        .map_err(|e| anyhow::anyhow!("bootstrapping admin: {}", e.message))?
    {
        info!(email = %admin.email, "Log in with the bootstrap admin account");
    }

    let state = Arc::new(AppState::new(config, db).context("configuring email provider")?);

    server::run(state).await?;
    Ok(())
}

/// `RUST_LOG` wins; otherwise info everywhere and debug for our crates.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storehub=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

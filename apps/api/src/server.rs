//! Axum server setup.
//!
//! Server skeleton with:
//! - Every route nested under `/api`
//! - Localhost-only CORS by default
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use storehub_db::Database;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::JwtManager;
use crate::config::AppConfig;
use crate::email::{provider, EmailError, EmailProvider, EmailService};
use crate::routes;

/// Origins allowed when CORS is not permissive.
const LOCAL_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    pub jwt: JwtManager,
    pub email: EmailService,
}

impl AppState {
    /// Builds the state with the provider named in `config.email`.
    pub fn new(config: AppConfig, db: Database) -> Result<Self, EmailError> {
        let provider = provider::from_config(&config.email)?;
        Ok(Self::with_provider(config, db, provider))
    }

    pub fn with_provider(config: AppConfig, db: Database, provider: Arc<dyn EmailProvider>) -> Self {
        let jwt = JwtManager::from_config(&config.auth);
        let email = EmailService::new(db.clone(), provider, config.email.from_address.clone());
        AppState {
            db,
            config,
            jwt,
            email,
        }
    }
}

/// Builds the full router. Used by `run` and by the HTTP tests.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = if state.config.server.cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = LOCAL_ORIGINS
            .iter()
            .copied()
            .map(HeaderValue::from_static)
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api = Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::router())
        .merge(routes::products::router())
        .merge(routes::inventory::router())
        .merge(routes::suppliers::router())
        .merge(routes::purchase_orders::router())
        .merge(routes::employees::router())
        .merge(routes::customers::router())
        .merge(routes::sales::router())
        .merge(routes::loyalty::router())
        .merge(routes::email::router())
        .merge(routes::cash_drawers::router())
        .merge(routes::reports::router());

    Router::new()
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until a shutdown signal arrives.
pub async fn run(state: Arc<AppState>) -> Result<(), ServerError> {
    let bind_addr = state.config.server.bind_addr;
    let app = build_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Health check endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use storehub_db::MigrationStatus;

use crate::server::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `degraded` (pending migrations) or `error`
    pub status: &'static str,
    pub database: &'static str,
    pub migrations: Option<MigrationStatus>,
    pub version: &'static str,
}

/// GET /health - 503 when the database cannot be queried
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    match state.db.migration_status().await {
        Ok(migrations) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: if migrations.is_current() { "ok" } else { "degraded" },
                database: "ok",
                migrations: Some(migrations),
                version: env!("CARGO_PKG_VERSION"),
            }),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "error",
                    database: "unavailable",
                    migrations: None,
                    version: env!("CARGO_PKG_VERSION"),
                }),
            )
        }
    }
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

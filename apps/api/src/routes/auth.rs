//! Login, token refresh and the current employee.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use storehub_core::Employee;
use storehub_db::DbError;
use tracing::{info, warn};

use crate::auth::{verify_dummy_password, verify_password, AuthUser, TokenPair};
use crate::error::ApiError;
use crate::extract::Json;
use crate::server::AppState;

const BAD_CREDENTIALS: &str = "Invalid email or password";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub employee: Employee,
}

/// POST /auth/login
///
/// Unknown email, wrong password and inactive account share one message.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let credentials = state.db.employees().find_credentials(&req.email).await?;

    let Some((employee, hash)) = credentials else {
        // same argon2 cost as a wrong password
        verify_dummy_password(&req.password);
        warn!("Login failed: unknown email");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    };

    let password_ok = verify_password(&req.password, &hash);
    if !employee.is_active || !password_ok {
        warn!(employee_id = %employee.id, "Login failed");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    }

    let tokens = state.jwt.issue_pair(&employee)?;
    info!(employee_id = %employee.id, role = employee.role.as_str(), "Employee logged in");

    Ok(Json(SessionResponse { tokens, employee }))
}

/// POST /auth/refresh
async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let claims = state.jwt.validate_refresh_token(&req.refresh_token)?;

    let employee = match state.db.employees().get(&claims.sub).await {
        Ok(employee) => employee,
        Err(DbError::NotFound { .. }) => return Err(ApiError::unauthorized("Unknown employee")),
        Err(e) => return Err(e.into()),
    };
    if !employee.is_active {
        return Err(ApiError::unauthorized("Employee is inactive"));
    }

    let tokens = state.jwt.issue_pair(&employee)?;
    Ok(Json(SessionResponse { tokens, employee }))
}

/// GET /auth/me
async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Employee>, ApiError> {
    let employee = state.db.employees().get(&user.employee_id).await?;
    Ok(Json(employee))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
}

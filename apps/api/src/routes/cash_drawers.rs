//! Cash drawer sessions.
//!
//! ```text
//! open ──► counting ──► closed ──► reconciled (manager+)
//!   ▲          │
//!   └─recount──┘
//! ```

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use storehub_core::validation::{validate_amount, validate_name, validate_positive};
use storehub_core::{
    CashDrawer, CashDrawerDetail, DrawerStatus, DrawerStatusChange, DrawerTransaction,
    NewDrawerTransaction, OpenDrawer, Page, Role,
};

use super::Listing;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct DrawerQuery {
    pub status: Option<DrawerStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// POST /cash-drawers/open
async fn open_drawer(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<OpenDrawer>,
) -> Result<(StatusCode, Json<CashDrawer>), ApiError> {
    validate_name("register_name", &req.register_name, 100)?;
    validate_amount("opening_balance_cents", req.opening_balance_cents)?;

    let drawer = state
        .db
        .cash_drawers()
        .open(&req, &user.employee_id)
        .await?;
    Ok((StatusCode::CREATED, Json(drawer)))
}

/// GET /cash-drawers
async fn list_drawers(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<DrawerQuery>,
) -> Result<Json<Listing<CashDrawer>>, ApiError> {
    let page = Page::new(params.limit, params.offset);
    let drawers = state.db.cash_drawers().list(params.status, page).await?;
    Ok(Json(Listing::new(drawers, page)))
}

/// GET /cash-drawers/{id} - session with its transactions
async fn get_drawer(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CashDrawerDetail>, ApiError> {
    Ok(Json(state.db.cash_drawers().get_detail(&id).await?))
}

/// POST /cash-drawers/{id}/transactions - cash in or cash out
async fn record_transaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<NewDrawerTransaction>,
) -> Result<(StatusCode, Json<DrawerTransaction>), ApiError> {
    // the kind carries the sign
    validate_positive("amount_cents", req.amount_cents)?;
    validate_amount("amount_cents", req.amount_cents)?;

    let transaction = state
        .db
        .cash_drawers()
        .record_transaction(&id, &req, Some(&user.employee_id))
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// PUT /cash-drawers/{id}/status
async fn change_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<DrawerStatusChange>,
) -> Result<Json<CashDrawer>, ApiError> {
    if req.status == DrawerStatus::Reconciled {
        user.require(Role::Manager)?;
    }
    if let Some(counted) = req.counted_balance_cents {
        validate_amount("counted_balance_cents", counted)?;
    }

    let drawer = state.db.cash_drawers().change_status(&id, &req).await?;
    Ok(Json(drawer))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cash-drawers", get(list_drawers))
        .route("/cash-drawers/open", post(open_drawer))
        .route("/cash-drawers/{id}", get(get_drawer))
        .route("/cash-drawers/{id}/transactions", post(record_transaction))
        .route("/cash-drawers/{id}/status", put(change_status))
}

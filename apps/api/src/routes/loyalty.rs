//! Loyalty accounts, the points ledger and the rewards catalog.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use storehub_core::validation::{validate_name, validate_points, validate_positive};
use storehub_core::{
    LoyaltyAccount, LoyaltyTransaction, LoyaltyTransactionKind, NewLoyaltyTransaction, NewReward,
    Page, Reward, RewardUpdate, Role, ValidationError,
};
use storehub_db::LedgerOutcome;

use super::{non_blank, Listing};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct TransactionQuery {
    pub customer_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct RewardQuery {
    pub include_inactive: Option<bool>,
}

#[derive(Deserialize)]
pub struct RedeemRequest {
    pub customer_id: String,
}

fn validate_reward_update(update: &RewardUpdate) -> Result<(), ValidationError> {
    if let Some(name) = &update.name {
        validate_name("name", name, 200)?;
    }
    if let Some(cost) = update.points_cost {
        validate_positive("points_cost", cost)?;
        validate_points("points_cost", cost)?;
    }
    Ok(())
}

/// GET /loyalty/accounts/{customer_id}
async fn get_account(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(customer_id): Path<String>,
) -> Result<Json<LoyaltyAccount>, ApiError> {
    Ok(Json(state.db.loyalty().account(&customer_id).await?))
}

/// POST /loyalty/transactions - manual earn, redeem or adjust
async fn record_transaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<NewLoyaltyTransaction>,
) -> Result<(StatusCode, Json<LedgerOutcome>), ApiError> {
    if req.kind == LoyaltyTransactionKind::Adjust {
        user.require(Role::Manager)?;
    }
    if req.customer_id.trim().is_empty() {
        return Err(ValidationError::required("customer_id").into());
    }
    validate_points("points", req.points)?;

    let outcome = state
        .db
        .loyalty()
        .record(&req, Some(&user.employee_id))
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /loyalty/transactions
async fn list_transactions(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<Listing<LoyaltyTransaction>>, ApiError> {
    let page = Page::new(params.limit, params.offset);
    let rows = state
        .db
        .loyalty()
        .transactions(non_blank(params.customer_id.as_deref()), page)
        .await?;
    Ok(Json(Listing::new(rows, page)))
}

/// GET /loyalty/rewards
async fn list_rewards(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<RewardQuery>,
) -> Result<Json<Vec<Reward>>, ApiError> {
    let rewards = state
        .db
        .loyalty()
        .rewards(params.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(rewards))
}

/// POST /loyalty/rewards
async fn create_reward(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<NewReward>,
) -> Result<(StatusCode, Json<Reward>), ApiError> {
    user.require(Role::Manager)?;
    validate_name("name", &req.name, 200)?;
    validate_positive("points_cost", req.points_cost)?;
    validate_points("points_cost", req.points_cost)?;

    let reward = state.db.loyalty().create_reward(&req).await?;
    Ok((StatusCode::CREATED, Json(reward)))
}

/// GET /loyalty/rewards/{id}
async fn get_reward(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Reward>, ApiError> {
    Ok(Json(state.db.loyalty().reward(&id).await?))
}

/// PUT /loyalty/rewards/{id}
async fn update_reward(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RewardUpdate>,
) -> Result<Json<Reward>, ApiError> {
    user.require(Role::Manager)?;
    validate_reward_update(&req)?;
    Ok(Json(state.db.loyalty().update_reward(&id, &req).await?))
}

/// DELETE /loyalty/rewards/{id} - deactivates
async fn delete_reward(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Role::Manager)?;
    state.db.loyalty().deactivate_reward(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /loyalty/rewards/{id}/redeem
async fn redeem_reward(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<LedgerOutcome>, ApiError> {
    if req.customer_id.trim().is_empty() {
        return Err(ValidationError::required("customer_id").into());
    }

    let outcome = state
        .db
        .loyalty()
        .redeem_reward(&id, &req.customer_id, Some(&user.employee_id))
        .await?;
    Ok(Json(outcome))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/loyalty/accounts/{customer_id}", get(get_account))
        .route(
            "/loyalty/transactions",
            get(list_transactions).post(record_transaction),
        )
        .route("/loyalty/rewards", get(list_rewards).post(create_reward))
        .route(
            "/loyalty/rewards/{id}",
            get(get_reward).put(update_reward).delete(delete_reward),
        )
        .route("/loyalty/rewards/{id}/redeem", post(redeem_reward))
}

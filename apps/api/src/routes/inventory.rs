//! Inventory endpoints: levels, settings, adjustments.
//!
//! A manual adjustment that takes a product down to its reorder level
//! triggers a best-effort `low_stock_alert` email.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use storehub_core::validation::{validate_stock_change, validate_stock_quantity};
use storehub_core::{
    AdjustInventory, InventoryAdjustment, InventoryLevel, Page, Role, ValidationError,
};
use tracing::debug;

use super::{non_blank, Listing};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::server::AppState;

pub const LOW_STOCK_TEMPLATE: &str = "low_stock_alert";

#[derive(Deserialize)]
pub struct LevelQuery {
    pub low_stock_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub product_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct SettingsRequest {
    pub reorder_level: Option<i64>,
    /// Empty string clears the location
    pub location: Option<String>,
}

/// A level with its low-stock flag.
#[derive(Serialize)]
pub struct LevelResponse {
    #[serde(flatten)]
    pub level: InventoryLevel,
    pub low_stock: bool,
}

impl From<InventoryLevel> for LevelResponse {
    fn from(level: InventoryLevel) -> Self {
        let low_stock = level.is_low_stock();
        LevelResponse { level, low_stock }
    }
}

#[derive(Serialize)]
pub struct AdjustResponse {
    pub level: LevelResponse,
    pub adjustment: InventoryAdjustment,
}

fn validate_adjustment(input: &AdjustInventory) -> Result<(), ValidationError> {
    if input.product_id.trim().is_empty() {
        return Err(ValidationError::required("product_id"));
    }
    validate_stock_change("quantity_change", input.quantity_change)?;
    if !input.reason.is_manual() {
        return Err(ValidationError::NotAllowed {
            field: "reason".to_string(),
            allowed: ["damaged", "shrinkage", "count_correction", "return", "other"]
                .iter()
                .map(|r| r.to_string())
                .collect(),
        });
    }
    Ok(())
}

/// GET /inventory
async fn list_levels(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<LevelQuery>,
) -> Result<Json<Listing<LevelResponse>>, ApiError> {
    let page = Page::new(params.limit, params.offset);
    let levels = state
        .db
        .inventory()
        .list(params.low_stock_only.unwrap_or(false), page)
        .await?;

    Ok(Json(Listing::new(
        levels.into_iter().map(LevelResponse::from).collect(),
        page,
    )))
}

/// GET /inventory/{product_id}
async fn get_level(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(product_id): Path<String>,
) -> Result<Json<LevelResponse>, ApiError> {
    let level = state.db.inventory().get(&product_id).await?;
    Ok(Json(level.into()))
}

/// PUT /inventory/{product_id} - reorder level and location
async fn update_settings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(product_id): Path<String>,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<LevelResponse>, ApiError> {
    user.require(Role::Manager)?;
    if let Some(reorder_level) = req.reorder_level {
        validate_stock_quantity("reorder_level", reorder_level)?;
    }

    let level = state
        .db
        .inventory()
        .update_settings(&product_id, req.reorder_level, req.location.as_deref())
        .await?;
    Ok(Json(level.into()))
}

/// POST /inventory/adjust
async fn adjust(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<AdjustInventory>,
) -> Result<Json<AdjustResponse>, ApiError> {
    user.require(Role::Manager)?;
    validate_adjustment(&req)?;

    let outcome = state
        .db
        .inventory()
        .adjust(&req, Some(&user.employee_id))
        .await?;

    if outcome.crossed_low_stock {
        send_low_stock_alert(&state, &outcome.level).await;
    }

    Ok(Json(AdjustResponse {
        level: outcome.level.into(),
        adjustment: outcome.adjustment,
    }))
}

async fn send_low_stock_alert(state: &AppState, level: &InventoryLevel) {
    let Some(recipient) = state.config.email.alert_recipient.as_deref() else {
        debug!(sku = %level.sku, "Low stock, but no alert recipient configured");
        return;
    };

    let variables = HashMap::from([
        ("sku".to_string(), level.sku.clone()),
        ("name".to_string(), level.name.clone()),
        ("quantity".to_string(), level.quantity.to_string()),
        ("reorder_level".to_string(), level.reorder_level.to_string()),
    ]);
    state
        .email
        .notify(LOW_STOCK_TEMPLATE, recipient, variables)
        .await;
}

/// GET /inventory/{product_id}/adjustments - newest first
async fn product_adjustments(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(product_id): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Listing<InventoryAdjustment>>, ApiError> {
    let page = Page::new(params.limit, params.offset);
    // 404 for unknown products rather than an empty list
    state.db.inventory().get(&product_id).await?;

    let rows = state.db.inventory().adjustments(&product_id, page).await?;
    Ok(Json(Listing::new(rows, page)))
}

/// GET /inventory/adjustments - recent adjustments across products
async fn adjustment_history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Listing<InventoryAdjustment>>, ApiError> {
    user.require(Role::Manager)?;
    let page = Page::new(params.limit, params.offset);

    let rows = state
        .db
        .inventory()
        .history(non_blank(params.product_id.as_deref()), page)
        .await?;
    Ok(Json(Listing::new(rows, page)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/inventory", get(list_levels))
        .route("/inventory/adjust", post(adjust))
        .route("/inventory/adjustments", get(adjustment_history))
        .route(
            "/inventory/{product_id}",
            get(get_level).put(update_settings),
        )
        .route("/inventory/{product_id}/adjustments", get(product_adjustments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use storehub_core::AdjustmentReason;

    fn adjustment(change: i64, reason: AdjustmentReason) -> AdjustInventory {
        AdjustInventory {
            product_id: "p1".into(),
            quantity_change: change,
            reason,
            notes: None,
        }
    }

    #[test]
    fn test_validate_adjustment() {
        assert!(validate_adjustment(&adjustment(-2, AdjustmentReason::Damaged)).is_ok());
        assert!(matches!(
            validate_adjustment(&adjustment(0, AdjustmentReason::Damaged)),
            Err(ValidationError::MustBeNonZero { .. })
        ));
        assert!(matches!(
            validate_adjustment(&adjustment(i64::MIN, AdjustmentReason::Damaged)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_adjustment(&adjustment(5, AdjustmentReason::Sale)),
            Err(ValidationError::NotAllowed { .. })
        ));
    }
}

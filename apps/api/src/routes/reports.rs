//! Compliance and management reports. Manager+ only.
//!
//! Every report takes an optional `from`/`to` window (RFC 3339, default
//! the last 30 days) and answers `{"period": {...}, "report": {...}}`.
//! Rows come from `ReportRepository`, aggregation from
//! `storehub_core::reporting`.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storehub_core::reporting::{
    adjustment_report, cash_variance, inventory_valuation, loyalty_liability, summarize_sales,
    tax_report, top_products, AdjustmentReport, CashVarianceReport, InventoryValuation,
    LoyaltyLiability, ProductSales, ReportPeriod, SalesSummary, TaxReport,
};
use storehub_core::Role;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::server::AppState;

pub const DEFAULT_TOP_PRODUCTS: usize = 10;
pub const MAX_TOP_PRODUCTS: usize = 100;

#[derive(Deserialize)]
pub struct PeriodQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct TopProductsQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct Report<T> {
    pub period: ReportPeriod,
    pub report: T,
}

fn authorize(
    user: &AuthUser,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<ReportPeriod, ApiError> {
    user.require(Role::Manager)?;
    Ok(ReportPeriod::resolve(from, to, Utc::now())?)
}

fn top_limit(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_TOP_PRODUCTS)
        .clamp(1, MAX_TOP_PRODUCTS)
}

/// GET /reports/sales-summary
async fn sales_summary(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<Report<SalesSummary>>, ApiError> {
    let period = authorize(&user, params.from, params.to)?;
    let sales = state.db.reports().sales_in(&period).await?;
    Ok(Json(Report {
        period,
        report: summarize_sales(&sales),
    }))
}

/// GET /reports/tax
async fn tax(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<Report<TaxReport>>, ApiError> {
    let period = authorize(&user, params.from, params.to)?;
    let items = state.db.reports().completed_items_in(&period).await?;
    Ok(Json(Report {
        period,
        report: tax_report(&items),
    }))
}

/// GET /reports/inventory-valuation - current stock; the window is echoed only
async fn valuation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<Report<InventoryValuation>>, ApiError> {
    let period = authorize(&user, params.from, params.to)?;
    let rows = state.db.reports().valuation_rows().await?;
    Ok(Json(Report {
        period,
        report: inventory_valuation(rows),
    }))
}

/// GET /reports/inventory-adjustments
async fn adjustments(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<Report<AdjustmentReport>>, ApiError> {
    let period = authorize(&user, params.from, params.to)?;
    let rows = state.db.reports().adjustments_in(&period).await?;
    Ok(Json(Report {
        period,
        report: adjustment_report(rows),
    }))
}

/// GET /reports/cash-variance
async fn variance(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<Report<CashVarianceReport>>, ApiError> {
    let period = authorize(&user, params.from, params.to)?;
    let drawers = state.db.reports().closed_drawers_in(&period).await?;
    Ok(Json(Report {
        period,
        report: cash_variance(drawers),
    }))
}

/// GET /reports/loyalty-liability - current balances
async fn liability(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<Report<LoyaltyLiability>>, ApiError> {
    let period = authorize(&user, params.from, params.to)?;
    let accounts = state.db.reports().loyalty_accounts().await?;
    Ok(Json(Report {
        period,
        report: loyalty_liability(&accounts, state.config.loyalty.point_value_cents),
    }))
}

/// GET /reports/top-products
async fn top(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<TopProductsQuery>,
) -> Result<Json<Report<Vec<ProductSales>>>, ApiError> {
    let period = authorize(&user, params.from, params.to)?;
    let items = state.db.reports().completed_items_in(&period).await?;
    Ok(Json(Report {
        period,
        report: top_products(&items, top_limit(params.limit)),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reports/sales-summary", get(sales_summary))
        .route("/reports/tax", get(tax))
        .route("/reports/inventory-valuation", get(valuation))
        .route("/reports/inventory-adjustments", get(adjustments))
        .route("/reports/cash-variance", get(variance))
        .route("/reports/loyalty-liability", get(liability))
        .route("/reports/top-products", get(top))
}

//! Checkout and sale history.
//!
//! ```text
//! POST /sales
//!   ├── validate lines and tender
//!   └── SaleRepository::create (one transaction)
//!         ├── sale + items (price/tax snapshots)
//!         ├── inventory -= quantity     reason: sale
//!         ├── loyalty points earned
//!         └── drawer += cash total      kind: sale
//!
//! POST /sales/{id}/void  (manager+)
//!   └── SaleRepository::void: stock back, points reversed, drawer refund
//! ```

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use storehub_core::validation::{validate_amount, validate_quantity, validate_sale_lines};
use storehub_core::{NewSale, Page, Role, Sale, SaleDetail, SaleStatus, ValidationError};
use storehub_db::SaleFilter;

use super::{non_blank, Listing};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct SaleQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub customer_id: Option<String>,
    pub status: Option<SaleStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn validate_new_sale(input: &NewSale) -> Result<(), ValidationError> {
    validate_sale_lines(input.items.len())?;
    for line in &input.items {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::required("product_id"));
        }
        validate_quantity(line.quantity)?;
    }
    if let Some(tendered) = input.tendered_cents {
        validate_amount("tendered_cents", tendered)?;
    }
    Ok(())
}

/// POST /sales
async fn create_sale(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<NewSale>,
) -> Result<(StatusCode, Json<SaleDetail>), ApiError> {
    validate_new_sale(&req)?;

    let detail = state
        .db
        .sales()
        .create(&req, &user.employee_id, state.config.loyalty.cents_per_point)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /sales
async fn list_sales(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<SaleQuery>,
) -> Result<Json<Listing<Sale>>, ApiError> {
    if let (Some(from), Some(to)) = (params.from, params.to) {
        if from > to {
            return Err(ApiError::bad_request("from must not be after to"));
        }
    }

    let filter = SaleFilter {
        from: params.from,
        to: params.to,
        customer_id: non_blank(params.customer_id.as_deref()).map(str::to_string),
        status: params.status,
    };
    let page = Page::new(params.limit, params.offset);

    let sales = state.db.sales().list(&filter, page).await?;
    Ok(Json(Listing::new(sales, page)))
}

/// GET /sales/{id}
async fn get_sale(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SaleDetail>, ApiError> {
    Ok(Json(state.db.sales().get_detail(&id).await?))
}

/// POST /sales/{id}/void
async fn void_sale(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SaleDetail>, ApiError> {
    user.require(Role::Manager)?;
    Ok(Json(state.db.sales().void(&id, &user.employee_id).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/{id}", get(get_sale))
        .route("/sales/{id}/void", post(void_sale))
}

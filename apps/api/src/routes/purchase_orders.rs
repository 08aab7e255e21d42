//! Purchase order endpoints. Every route is manager+.
//!
//! ```text
//! draft ──submit──► submitted ──receive──► partially_received ──► received
//!   │                   │                                          ▲
//!   └──► cancelled ◄────┘──────────────receive (all lines)─────────┘
//! ```
//!
//! Submitting an order emails the supplier when it has an address on file.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use storehub_core::drawer::format_currency;
use storehub_core::validation::{
    validate_amount, validate_positive, validate_sale_lines, validate_stock_quantity,
};
use storehub_core::{
    Money, NewPurchaseOrder, Page, PurchaseOrder, PurchaseOrderDetail, PurchaseOrderStatus,
    ReceiveLine, Role, ValidationError,
};
use tracing::debug;

use super::{non_blank, Listing};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::server::AppState;

pub const SUBMITTED_TEMPLATE: &str = "purchase_order_submitted";

#[derive(Deserialize)]
pub struct OrderQuery {
    pub status: Option<PurchaseOrderStatus>,
    pub supplier_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: PurchaseOrderStatus,
}

#[derive(Deserialize)]
pub struct ReceiveRequest {
    pub items: Vec<ReceiveLine>,
}

fn validate_new_order(input: &NewPurchaseOrder) -> Result<(), ValidationError> {
    if input.supplier_id.trim().is_empty() {
        return Err(ValidationError::required("supplier_id"));
    }
    validate_sale_lines(input.items.len())?;
    for item in &input.items {
        if item.product_id.trim().is_empty() {
            return Err(ValidationError::required("product_id"));
        }
        validate_positive("quantity", item.quantity)?;
        validate_stock_quantity("quantity", item.quantity)?;
        validate_amount("unit_cost_cents", item.unit_cost_cents)?;
    }
    Ok(())
}

fn validate_receipt(lines: &[ReceiveLine]) -> Result<(), ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::required("items"));
    }
    for line in lines {
        validate_positive("quantity_received", line.quantity_received)?;
        validate_stock_quantity("quantity_received", line.quantity_received)?;
    }
    Ok(())
}

/// GET /purchase-orders
async fn list_orders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<OrderQuery>,
) -> Result<Json<Listing<PurchaseOrder>>, ApiError> {
    user.require(Role::Manager)?;
    let page = Page::new(params.limit, params.offset);

    let orders = state
        .db
        .purchase_orders()
        .list(params.status, non_blank(params.supplier_id.as_deref()), page)
        .await?;
    Ok(Json(Listing::new(orders, page)))
}

/// POST /purchase-orders - creates a draft
async fn create_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<NewPurchaseOrder>,
) -> Result<(StatusCode, Json<PurchaseOrderDetail>), ApiError> {
    user.require(Role::Manager)?;
    validate_new_order(&req)?;

    let detail = state
        .db
        .purchase_orders()
        .create(&req, Some(&user.employee_id))
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /purchase-orders/{id}
async fn get_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PurchaseOrderDetail>, ApiError> {
    user.require(Role::Manager)?;
    Ok(Json(state.db.purchase_orders().get_detail(&id).await?))
}

/// PUT /purchase-orders/{id}/status
async fn change_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<PurchaseOrder>, ApiError> {
    user.require(Role::Manager)?;

    let order = state.db.purchase_orders().set_status(&id, req.status).await?;

    if order.status == PurchaseOrderStatus::Submitted {
        notify_supplier(&state, &order).await;
    }

    Ok(Json(order))
}

async fn notify_supplier(state: &AppState, order: &PurchaseOrder) {
    let supplier = match state.db.suppliers().get(&order.supplier_id).await {
        Ok(supplier) => supplier,
        Err(e) => {
            tracing::warn!(po = %order.po_number, error = %e, "Could not load supplier for notification");
            return;
        }
    };

    let Some(email) = supplier.email.as_deref() else {
        debug!(po = %order.po_number, "Supplier has no email, skipping notification");
        return;
    };

    let expected = order
        .expected_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "TBD".to_string());

    let variables = HashMap::from([
        ("supplier_name".to_string(), supplier.name.clone()),
        ("po_number".to_string(), order.po_number.clone()),
        (
            "total".to_string(),
            format_currency(Money::from_cents(order.total_cost_cents)),
        ),
        ("expected_date".to_string(), expected),
    ]);
    state.email.notify(SUBMITTED_TEMPLATE, email, variables).await;
}

/// POST /purchase-orders/{id}/receive
async fn receive_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ReceiveRequest>,
) -> Result<Json<PurchaseOrderDetail>, ApiError> {
    user.require(Role::Manager)?;
    validate_receipt(&req.items)?;

    let detail = state
        .db
        .purchase_orders()
        .receive(&id, &req.items, Some(&user.employee_id))
        .await?;
    Ok(Json(detail))
}

/// DELETE /purchase-orders/{id} - drafts only
async fn delete_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Role::Manager)?;
    state.db.purchase_orders().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/purchase-orders", get(list_orders).post(create_order))
        .route("/purchase-orders/{id}", get(get_order).delete(delete_order))
        .route("/purchase-orders/{id}/status", put(change_status))
        .route("/purchase-orders/{id}/receive", post(receive_order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use storehub_core::NewPurchaseOrderItem;

    fn order(items: Vec<(i64, i64)>) -> NewPurchaseOrder {
        NewPurchaseOrder {
            supplier_id: "sup-1".into(),
            expected_date: None,
            notes: None,
            items: items
                .into_iter()
                .map(|(quantity, unit_cost_cents)| NewPurchaseOrderItem {
                    product_id: "p1".into(),
                    quantity,
                    unit_cost_cents,
                })
                .collect(),
        }
    }

    #[test]
    fn test_validate_new_order() {
        assert!(validate_new_order(&order(vec![(5, 120), (1, 0)])).is_ok());
        assert!(validate_new_order(&order(vec![])).is_err());
        assert!(validate_new_order(&order(vec![(0, 120)])).is_err());
        assert!(validate_new_order(&order(vec![(2, -1)])).is_err());
        assert!(validate_new_order(&order(vec![(3, i64::MAX / 2)])).is_err());
        assert!(validate_new_order(&order(vec![(i64::MAX, 1)])).is_err());
    }

    #[test]
    fn test_validate_receipt() {
        let line = |q| ReceiveLine {
            item_id: "i1".into(),
            quantity_received: q,
        };
        assert!(validate_receipt(&[line(3)]).is_ok());
        assert!(validate_receipt(&[]).is_err());
        assert!(validate_receipt(&[line(0)]).is_err());
        assert!(validate_receipt(&[line(i64::MAX)]).is_err());
    }
}

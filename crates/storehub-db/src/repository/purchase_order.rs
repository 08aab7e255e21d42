//! # Purchase Order Repository
//!
//! Purchasing and receiving.
//!
//! ## Receiving
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  receive(order_id, [ReceiveLine])               one transaction        │
//! │       │                                                                 │
//! │       ├── order.status ∈ {submitted, partially_received}               │
//! │       ├── per line: quantity ≤ outstanding      (else OverReceipt)      │
//! │       │     ├── UPDATE purchase_order_items quantity_received += n     │
//! │       │     └── stock change +n, reason `received`, reference order    │
//! │       └── every line complete ? received : partially_received          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use storehub_core::pricing::po_number;
use storehub_core::validation::validate_positive;
use storehub_core::{
    AdjustmentReason, CoreError, NewPurchaseOrder, Page, PurchaseOrder, PurchaseOrderDetail,
    PurchaseOrderItem, PurchaseOrderStatus, ReceiveLine,
};
use tracing::{debug, info};

use super::inventory::{apply_change_in, StockChange};
use super::{begin_write, clean, new_id};
use crate::error::{DbError, DbResult};

const ORDER_COLUMNS: &str = "id, po_number, supplier_id, status, expected_date, notes, \
     total_cost_cents, created_by, created_at, updated_at, submitted_at, received_at";

const ITEM_COLUMNS: &str = "id, purchase_order_id, product_id, quantity_ordered, \
     quantity_received, unit_cost_cents, line_total_cents";

#[derive(Debug, Clone)]
pub struct PurchaseOrderRepository {
    pool: SqlitePool,
}

impl PurchaseOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseOrderRepository { pool }
    }

    /// Lists orders newest first.
    pub async fn list(
        &self,
        status: Option<PurchaseOrderStatus>,
        supplier_id: Option<&str>,
        page: Page,
    ) -> DbResult<Vec<PurchaseOrder>> {
        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM purchase_orders
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR supplier_id = ?2)
            ORDER BY created_at DESC, po_number DESC
            LIMIT ?3 OFFSET ?4
            "#
        );

        let orders = sqlx::query_as::<_, PurchaseOrder>(&sql)
            .bind(status)
            .bind(supplier_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Gets an order together with its lines.
    pub async fn get_detail(&self, id: &str) -> DbResult<PurchaseOrderDetail> {
        let mut conn = self.pool.acquire().await?;
        let order = fetch_order(&mut conn, id).await?;
        let items = fetch_items(&mut conn, id).await?;
        Ok(PurchaseOrderDetail { order, items })
    }

    /// Creates a draft order. The supplier must be active and every product
    /// must exist.
    pub async fn create(
        &self,
        input: &NewPurchaseOrder,
        employee_id: Option<&str>,
    ) -> DbResult<PurchaseOrderDetail> {
        info!(
            supplier_id = %input.supplier_id,
            lines = input.items.len(),
            "Creating purchase order"
        );

        let now = Utc::now();
        let order_id = new_id();
        let order = PurchaseOrder {
            po_number: po_number(now.date_naive(), &new_id()),
            id: order_id.clone(),
            supplier_id: input.supplier_id.clone(),
            status: PurchaseOrderStatus::Draft,
            expected_date: input.expected_date,
            notes: clean(input.notes.as_deref()),
            total_cost_cents: input.total_cost().cents(),
            created_by: employee_id.map(str::to_string),
            created_at: now,
            updated_at: now,
            submitted_at: None,
            received_at: None,
        };

        let mut tx = begin_write(&self.pool).await?;

        let supplier_active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM suppliers WHERE id = ?1")
                .bind(&input.supplier_id)
                .fetch_optional(&mut *tx)
                .await?;
        match supplier_active {
            None => return Err(DbError::not_found("Supplier", &input.supplier_id)),
            Some(false) => {
                return Err(CoreError::Inactive {
                    entity: "Supplier".to_string(),
                    id: input.supplier_id.clone(),
                }
                .into())
            }
            Some(true) => {}
        }

        sqlx::query(
            r#"
            INSERT INTO purchase_orders (
                id, po_number, supplier_id, status, expected_date, notes,
                total_cost_cents, created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&order.id)
        .bind(&order.po_number)
        .bind(&order.supplier_id)
        .bind(order.status)
        .bind(order.expected_date)
        .bind(&order.notes)
        .bind(order.total_cost_cents)
        .bind(&order.created_by)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?1")
                .bind(&line.product_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(DbError::not_found("Product", &line.product_id));
            }

            let item = PurchaseOrderItem {
                id: new_id(),
                purchase_order_id: order_id.clone(),
                product_id: line.product_id.clone(),
                quantity_ordered: line.quantity,
                quantity_received: 0,
                unit_cost_cents: line.unit_cost_cents,
                line_total_cents: line.quantity * line.unit_cost_cents,
            };

            sqlx::query(
                r#"
                INSERT INTO purchase_order_items (
                    id, purchase_order_id, product_id, quantity_ordered,
                    quantity_received, unit_cost_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.purchase_order_id)
            .bind(&item.product_id)
            .bind(item.quantity_ordered)
            .bind(item.quantity_received)
            .bind(item.unit_cost_cents)
            .bind(item.line_total_cents)
            .execute(&mut *tx)
            .await?;

            items.push(item);
        }

        tx.commit().await?;

        info!(po_number = %order.po_number, "Purchase order created");
        Ok(PurchaseOrderDetail { order, items })
    }

    /// Moves an order along the status whitelist.
    ///
    /// The update is conditional on the status read, so a concurrent change
    /// surfaces as an invalid transition instead of being overwritten.
    pub async fn set_status(&self, id: &str, next: PurchaseOrderStatus) -> DbResult<PurchaseOrder> {
        let mut conn = self.pool.acquire().await?;
        let current = fetch_order(&mut conn, id).await?;
        ensure_transition(current.status, next)?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE purchase_orders SET
                status = ?2,
                updated_at = ?4,
                submitted_at = CASE WHEN ?2 = 'submitted' THEN ?4 ELSE submitted_at END,
                received_at = CASE WHEN ?2 = 'received' THEN ?4 ELSE received_at END
            WHERE id = ?1 AND status = ?3
            "#,
        )
        .bind(id)
        .bind(next)
        .bind(current.status)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let latest = fetch_order(&mut conn, id).await?;
            ensure_transition(latest.status, next)?;
        }

        debug!(id = %id, from = current.status.as_str(), to = next.as_str(), "Purchase order status changed");
        fetch_order(&mut conn, id).await
    }

    /// Books goods in against an order.
    pub async fn receive(
        &self,
        id: &str,
        lines: &[ReceiveLine],
        employee_id: Option<&str>,
    ) -> DbResult<PurchaseOrderDetail> {
        info!(id = %id, lines = lines.len(), "Receiving purchase order");

        let mut tx = begin_write(&self.pool).await?;

        let order = fetch_order(&mut tx, id).await?;
        if !order.status.accepts_receipts() {
            return Err(CoreError::InvalidTransition {
                entity: "purchase order".to_string(),
                from: order.status.as_str().to_string(),
                to: PurchaseOrderStatus::Received.as_str().to_string(),
            }
            .into());
        }

        let mut items: HashMap<String, PurchaseOrderItem> = fetch_items(&mut tx, id)
            .await?
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        for line in lines {
            validate_positive("quantity_received", line.quantity_received)?;

            let item = items
                .get_mut(&line.item_id)
                .ok_or_else(|| DbError::not_found("Purchase order item", &line.item_id))?;

            if line.quantity_received > item.outstanding() {
                return Err(CoreError::OverReceipt {
                    item_id: item.id.clone(),
                    outstanding: item.outstanding(),
                    requested: line.quantity_received,
                }
                .into());
            }

            sqlx::query(
                "UPDATE purchase_order_items SET quantity_received = quantity_received + ?2 WHERE id = ?1",
            )
            .bind(&item.id)
            .bind(line.quantity_received)
            .execute(&mut *tx)
            .await?;
            item.quantity_received += line.quantity_received;

            apply_change_in(
                &mut *tx,
                &StockChange {
                    product_id: &item.product_id,
                    quantity_change: line.quantity_received,
                    reason: AdjustmentReason::Received,
                    reference_id: Some(id),
                    notes: Some(&order.po_number),
                    employee_id,
                },
            )
            .await?;
        }

        let next = if items.values().all(PurchaseOrderItem::is_complete) {
            PurchaseOrderStatus::Received
        } else {
            PurchaseOrderStatus::PartiallyReceived
        };

        if next != order.status {
            let now = Utc::now();
            sqlx::query(
                r#"
                UPDATE purchase_orders SET
                    status = ?2,
                    updated_at = ?3,
                    received_at = CASE WHEN ?2 = 'received' THEN ?3 ELSE received_at END
                WHERE id = ?1
                "#,
            )
            .bind(id)
            .bind(next)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        let order = fetch_order(&mut tx, id).await?;
        let items = fetch_items(&mut tx, id).await?;

        tx.commit().await?;

        info!(po_number = %order.po_number, status = order.status.as_str(), "Goods received");
        Ok(PurchaseOrderDetail { order, items })
    }

    /// Deletes an order. Only drafts can be deleted; lines cascade.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        let order = fetch_order(&mut conn, id).await?;
        if order.status != PurchaseOrderStatus::Draft {
            return Err(CoreError::InvalidTransition {
                entity: "purchase order".to_string(),
                from: order.status.as_str().to_string(),
                to: "deleted".to_string(),
            }
            .into());
        }

        sqlx::query("DELETE FROM purchase_orders WHERE id = ?1 AND status = 'draft'")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

fn ensure_transition(from: PurchaseOrderStatus, to: PurchaseOrderStatus) -> DbResult<()> {
    if !from.can_transition_to(to) {
        return Err(CoreError::InvalidTransition {
            entity: "purchase order".to_string(),
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        }
        .into());
    }
    Ok(())
}

async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<PurchaseOrder> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM purchase_orders WHERE id = ?1");

    sqlx::query_as::<_, PurchaseOrder>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Purchase order", id))
}

async fn fetch_items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<PurchaseOrderItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM purchase_order_items WHERE purchase_order_id = ?1 ORDER BY rowid"
    );

    let items = sqlx::query_as::<_, PurchaseOrderItem>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(items)
}

// =============================================================================
// Tests
// =============================================================================

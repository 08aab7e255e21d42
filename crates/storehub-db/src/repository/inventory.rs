//! # Inventory Repository
//!
//! Stock levels and the append-only adjustment trail.
//!
//! ## Stock Change Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_change_in(conn, StockChange)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE inventory_levels SET quantity = quantity + Δ                   │
//! │   WHERE product_id = ?                                                  │
//! │     AND (Δ > 0 OR quantity + Δ >= 0 OR product allows negative)        │
//! │   RETURNING quantity                                                    │
//! │       │                                                                 │
//! │       ├── no row ──► NotFound / InsufficientStock                      │
//! │       ▼                                                                 │
//! │  INSERT inventory_adjustments (Δ, quantity_after, reason, reference)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The check and the write are one statement, so two concurrent sales of
//! the last unit cannot both succeed.

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use storehub_core::validation::validate_stock_change;
use storehub_core::{AdjustInventory, AdjustmentReason, CoreError, InventoryAdjustment, InventoryLevel, Page};
use tracing::{debug, info};

use super::{begin_write, clean, new_id};
use crate::error::{DbError, DbResult};

const LEVEL_SELECT: &str = r#"
    SELECT l.product_id, p.sku, p.name, l.quantity, l.reorder_level, l.location, l.updated_at
    FROM inventory_levels l
    JOIN products p ON p.id = l.product_id
"#;

const ADJUSTMENT_COLUMNS: &str = "id, product_id, quantity_change, quantity_after, reason, \
     reference_id, notes, employee_id, created_at";

/// One stock movement, written by adjustments, sales, voids and receiving.
#[derive(Debug, Clone)]
pub(crate) struct StockChange<'a> {
    pub product_id: &'a str,
    pub quantity_change: i64,
    pub reason: AdjustmentReason,
    pub reference_id: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub employee_id: Option<&'a str>,
}

/// Applies a stock change on an open connection or transaction.
///
/// ## Returns
/// * `Err(DbError::NotFound)` - the product has no inventory row
/// * `Err(CoreError::InsufficientStock)` - the level would drop below zero
///   and the product neither allows negative stock nor skips tracking
pub(crate) async fn apply_change_in(
    conn: &mut SqliteConnection,
    change: &StockChange<'_>,
) -> DbResult<InventoryAdjustment> {
    let now = Utc::now();

    let quantity_after: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE inventory_levels
        SET quantity = quantity + ?1, updated_at = ?2
        WHERE product_id = ?3
          AND (?1 > 0
               OR quantity + ?1 >= 0
               OR EXISTS (SELECT 1 FROM products p
                          WHERE p.id = inventory_levels.product_id
                            AND (p.allow_negative_stock = 1 OR p.track_inventory = 0)))
        RETURNING quantity
        "#,
    )
    .bind(change.quantity_change)
    .bind(now)
    .bind(change.product_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(quantity_after) = quantity_after else {
        let current: Option<(String, i64)> = sqlx::query_as(
            r#"
            SELECT p.sku, l.quantity
            FROM inventory_levels l
            JOIN products p ON p.id = l.product_id
            WHERE l.product_id = ?1
            "#,
        )
        .bind(change.product_id)
        .fetch_optional(&mut *conn)
        .await?;

        return Err(match current {
            Some((sku, available)) => CoreError::InsufficientStock {
                sku,
                available,
                requested: change.quantity_change.saturating_neg(),
            }
            .into(),
            None => DbError::not_found("Product", change.product_id),
        });
    };

    let adjustment = InventoryAdjustment {
        id: new_id(),
        product_id: change.product_id.to_string(),
        quantity_change: change.quantity_change,
        quantity_after,
        reason: change.reason,
        reference_id: change.reference_id.map(str::to_string),
        notes: clean(change.notes),
        employee_id: change.employee_id.map(str::to_string),
        created_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO inventory_adjustments (
            id, product_id, quantity_change, quantity_after, reason,
            reference_id, notes, employee_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&adjustment.id)
    .bind(&adjustment.product_id)
    .bind(adjustment.quantity_change)
    .bind(adjustment.quantity_after)
    .bind(adjustment.reason)
    .bind(&adjustment.reference_id)
    .bind(&adjustment.notes)
    .bind(&adjustment.employee_id)
    .bind(adjustment.created_at)
    .execute(&mut *conn)
    .await?;

    debug!(
        product_id = %change.product_id,
        change = change.quantity_change,
        after = quantity_after,
        reason = change.reason.as_str(),
        "Stock changed"
    );

    Ok(adjustment)
}

/// Result of a manual adjustment.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentOutcome {
    pub level: InventoryLevel,
    pub adjustment: InventoryAdjustment,
    /// The level moved from above the reorder point to at-or-below it.
    pub crossed_low_stock: bool,
}

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Lists stock levels of active products, optionally only those at or
    /// below their reorder point.
    pub async fn list(&self, low_stock_only: bool, page: Page) -> DbResult<Vec<InventoryLevel>> {
        let sql = format!(
            r#"
            {LEVEL_SELECT}
            WHERE p.is_active = 1
              AND (?1 = 0 OR l.quantity <= l.reorder_level)
            ORDER BY p.name, p.sku
            LIMIT ?2 OFFSET ?3
            "#
        );

        let levels = sqlx::query_as::<_, InventoryLevel>(&sql)
            .bind(low_stock_only)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(levels)
    }

    /// Gets the level for one product.
    pub async fn get(&self, product_id: &str) -> DbResult<InventoryLevel> {
        let sql = format!("{LEVEL_SELECT} WHERE l.product_id = ?1");

        sqlx::query_as::<_, InventoryLevel>(&sql)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory", product_id))
    }

    /// Changes the reorder point and/or shelf location. Quantity is never
    /// set directly.
    pub async fn update_settings(
        &self,
        product_id: &str,
        reorder_level: Option<i64>,
        location: Option<&str>,
    ) -> DbResult<InventoryLevel> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_levels SET
                reorder_level = COALESCE(?2, reorder_level),
                location = CASE WHEN ?3 IS NULL THEN location ELSE NULLIF(TRIM(?3), '') END,
                updated_at = ?4
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .bind(reorder_level)
        .bind(location)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory", product_id));
        }

        self.get(product_id).await
    }

    /// Applies a manual adjustment in its own transaction.
    pub async fn adjust(
        &self,
        input: &AdjustInventory,
        employee_id: Option<&str>,
    ) -> DbResult<AdjustmentOutcome> {
        info!(
            product_id = %input.product_id,
            change = input.quantity_change,
            reason = input.reason.as_str(),
            "Adjusting inventory"
        );

        validate_stock_change("quantity_change", input.quantity_change)?;

        let mut tx = begin_write(&self.pool).await?;

        let adjustment = apply_change_in(
            &mut *tx,
            &StockChange {
                product_id: &input.product_id,
                quantity_change: input.quantity_change,
                reason: input.reason,
                reference_id: None,
                notes: input.notes.as_deref(),
                employee_id,
            },
        )
        .await?;

        let sql = format!("{LEVEL_SELECT} WHERE l.product_id = ?1");
        let level = sqlx::query_as::<_, InventoryLevel>(&sql)
            .bind(&input.product_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        let before = adjustment.quantity_after - adjustment.quantity_change;
        let crossed_low_stock = before > level.reorder_level && level.is_low_stock();

        Ok(AdjustmentOutcome {
            level,
            adjustment,
            crossed_low_stock,
        })
    }

    /// Adjustment history for one product, newest first.
    pub async fn adjustments(
        &self,
        product_id: &str,
        page: Page,
    ) -> DbResult<Vec<InventoryAdjustment>> {
        self.history(Some(product_id), page).await
    }

    /// Adjustment history, newest first. `None` returns every product.
    pub async fn history(
        &self,
        product_id: Option<&str>,
        page: Page,
    ) -> DbResult<Vec<InventoryAdjustment>> {
        let sql = format!(
            r#"
            SELECT {ADJUSTMENT_COLUMNS}
            FROM inventory_adjustments
            WHERE (?1 IS NULL OR product_id = ?1)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "#
        );

        let rows = sqlx::query_as::<_, InventoryAdjustment>(&sql)
            .bind(product_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

// =============================================================================
// Tests
// =============================================================================

//! # Report Repository
//!
//! Raw rows for the compliance reports. Every method is a plain read over a
//! period; the aggregation lives in `storehub_core::reporting`.

use sqlx::SqlitePool;
use storehub_core::reporting::{ReportPeriod, ValuationRow};
use storehub_core::{CashDrawer, InventoryAdjustment, LoyaltyAccount, Sale, SaleItem};

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Every sale created in the period, completed or voided.
    pub async fn sales_in(&self, period: &ReportPeriod) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, receipt_number, status, customer_id, employee_id, cash_drawer_id,
                   subtotal_cents, tax_cents, total_cents, payment_method, tendered_cents,
                   change_cents, points_earned, created_at, voided_at
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY created_at
            "#,
        )
        .bind(period.from)
        .bind(period.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Items of completed sales in the period.
    pub async fn completed_items_in(&self, period: &ReportPeriod) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT i.id, i.sale_id, i.product_id, i.sku_snapshot, i.name_snapshot,
                   i.unit_price_cents, i.tax_rate_bps, i.quantity, i.line_total_cents, i.tax_cents
            FROM sale_items i
            JOIN sales s ON s.id = i.sale_id
            WHERE s.status = 'completed' AND s.created_at >= ?1 AND s.created_at < ?2
            ORDER BY s.created_at, i.rowid
            "#,
        )
        .bind(period.from)
        .bind(period.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Current stock of active, tracked products. Valuation is a snapshot,
    /// not a period report.
    pub async fn valuation_rows(&self) -> DbResult<Vec<ValuationRow>> {
        let rows = sqlx::query_as::<_, ValuationRow>(
            r#"
            SELECT p.id AS product_id, p.sku, p.name, l.quantity, p.cost_cents, p.price_cents
            FROM products p
            JOIN inventory_levels l ON l.product_id = p.id
            WHERE p.is_active = 1 AND p.track_inventory = 1
            ORDER BY p.name, p.sku
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn adjustments_in(&self, period: &ReportPeriod) -> DbResult<Vec<InventoryAdjustment>> {
        let rows = sqlx::query_as::<_, InventoryAdjustment>(
            r#"
            SELECT id, product_id, quantity_change, quantity_after, reason,
                   reference_id, notes, employee_id, created_at
            FROM inventory_adjustments
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY created_at, rowid
            "#,
        )
        .bind(period.from)
        .bind(period.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Drawers closed in the period (closed or already reconciled).
    pub async fn closed_drawers_in(&self, period: &ReportPeriod) -> DbResult<Vec<CashDrawer>> {
        let drawers = sqlx::query_as::<_, CashDrawer>(
            r#"
            SELECT id, register_name, employee_id, status, opening_balance_cents,
                   expected_balance_cents, counted_balance_cents, variance_cents,
                   notes, opened_at, closed_at
            FROM cash_drawers
            WHERE status IN ('closed', 'reconciled')
              AND closed_at >= ?1 AND closed_at < ?2
            ORDER BY closed_at
            "#,
        )
        .bind(period.from)
        .bind(period.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(drawers)
    }

    /// Loyalty accounts of active customers.
    pub async fn loyalty_accounts(&self) -> DbResult<Vec<LoyaltyAccount>> {
        let accounts = sqlx::query_as::<_, LoyaltyAccount>(
            r#"
            SELECT a.customer_id, a.points_balance, a.lifetime_points, a.tier, a.created_at, a.updated_at
            FROM loyalty_accounts a
            JOIN customers c ON c.id = a.customer_id
            WHERE c.is_active = 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }
}

//! # Sale Repository
//!
//! Checkout and voids.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (one transaction)                                           │
//! │     ├── products active, stock available (Product::can_sell)           │
//! │     ├── line amounts, totals, change due                               │
//! │     ├── drawer open (if given), customer active (if given)             │
//! │     ├── stock change −qty per tracked line    reason `sale`            │
//! │     ├── INSERT sales (daily receipt number) + sale_items               │
//! │     ├── loyalty earn for the customer                                   │
//! │     └── drawer `sale` movement for cash payments                       │
//! │                                                                         │
//! │  2. (OPTIONAL) VOID (one transaction, completed sales only)            │
//! │     ├── status → voided                                                │
//! │     ├── stock change +qty per tracked line    reason `void`            │
//! │     ├── loyalty adjust −earned, clamped at the current balance         │
//! │     └── drawer `refund` movement if the drawer is still open           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use storehub_core::loyalty::points_for_purchase;
use storehub_core::pricing::{change_due, line_amounts, receipt_number, LineAmounts, SaleTotals};
use storehub_core::validation::{validate_quantity, validate_sale_lines};
use storehub_core::{
    AdjustmentReason, CoreError, DrawerStatus, DrawerTransactionKind, LedgerEntry, LoyaltyTier,
    LoyaltyTransactionKind, Money, NewSale, Page, PaymentMethod, Product, Sale, SaleDetail,
    SaleItem, SaleStatus,
};
use tracing::{debug, info};

use super::cash_drawer::{self, fetch_drawer, CashMovement};
use super::inventory::{apply_change_in, StockChange};
use super::loyalty::{self, ensure_active_customer};
use super::{begin_write, new_id};
use super::product::PRODUCT_COLUMNS;
use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str = "id, receipt_number, status, customer_id, employee_id, cash_drawer_id, \
     subtotal_cents, tax_cents, total_cents, payment_method, tendered_cents, change_cents, \
     points_earned, created_at, voided_at";

const ITEM_COLUMNS: &str = "id, sale_id, product_id, sku_snapshot, name_snapshot, \
     unit_price_cents, tax_rate_bps, quantity, line_total_cents, tax_cents";

/// List filters for `GET /api/sales` and customer purchase history.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub customer_id: Option<String>,
    pub status: Option<SaleStatus>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Rings up a sale.
    ///
    /// ## Arguments
    /// * `input` - lines, payment and optional customer / drawer
    /// * `employee_id` - the cashier
    /// * `cents_per_point` - loyalty earn rate from configuration
    pub async fn create(
        &self,
        input: &NewSale,
        employee_id: &str,
        cents_per_point: i64,
    ) -> DbResult<SaleDetail> {
        validate_sale_lines(input.items.len())?;
        for line in &input.items {
            validate_quantity(line.quantity)?;
        }

        info!(
            lines = input.items.len(),
            payment = input.payment_method.as_str(),
            "Creating sale"
        );

        let mut tx = begin_write(&self.pool).await?;

        // Resolve products and check stock for the whole basket first.
        let mut products: HashMap<String, Product> = HashMap::new();
        let mut requested: HashMap<String, i64> = HashMap::new();
        for line in &input.items {
            if !products.contains_key(&line.product_id) {
                let product = fetch_product(&mut tx, &line.product_id).await?;
                if !product.is_active {
                    return Err(CoreError::Inactive {
                        entity: "Product".to_string(),
                        id: product.id,
                    }
                    .into());
                }
                products.insert(product.id.clone(), product);
            }
            *requested.entry(line.product_id.clone()).or_insert(0) += line.quantity;
        }

        for (product_id, quantity) in &requested {
            let product = &products[product_id];
            let on_hand: i64 =
                sqlx::query_scalar("SELECT quantity FROM inventory_levels WHERE product_id = ?1")
                    .bind(product_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .unwrap_or(0);

            if !product.can_sell(on_hand, *quantity) {
                return Err(CoreError::InsufficientStock {
                    sku: product.sku.clone(),
                    available: on_hand,
                    requested: *quantity,
                }
                .into());
            }
        }

        let amounts: Vec<LineAmounts> = input
            .items
            .iter()
            .map(|line| {
                let product = &products[&line.product_id];
                line_amounts(product.price(), product.tax_rate(), line.quantity)
            })
            .collect();
        let totals = SaleTotals::from_lines(&amounts);
        let change = change_due(
            input.payment_method,
            totals.total,
            input.tendered_cents.map(Money::from_cents),
        )?;

        if let Some(drawer_id) = &input.cash_drawer_id {
            let drawer = fetch_drawer(&mut tx, drawer_id).await?;
            if drawer.status != DrawerStatus::Open {
                return Err(CoreError::DrawerNotOpen {
                    id: drawer.id,
                    status: drawer.status.as_str().to_string(),
                }
                .into());
            }
        }

        let points_earned = match &input.customer_id {
            Some(customer_id) => {
                ensure_active_customer(&mut tx, customer_id).await?;
                let tier: LoyaltyTier =
                    sqlx::query_scalar("SELECT tier FROM loyalty_accounts WHERE customer_id = ?1")
                        .bind(customer_id)
                        .fetch_optional(&mut *tx)
                        .await?
                        .ok_or_else(|| DbError::not_found("Loyalty account", customer_id))?;
                points_for_purchase(totals.total.cents(), cents_per_point, tier)
            }
            None => 0,
        };

        let now = Utc::now();
        let sale_id = new_id();

        for (product_id, quantity) in &requested {
            if !products[product_id].track_inventory {
                continue;
            }
            apply_change_in(
                &mut tx,
                &StockChange {
                    product_id,
                    quantity_change: -quantity,
                    reason: AdjustmentReason::Sale,
                    reference_id: Some(&sale_id),
                    notes: None,
                    employee_id: Some(employee_id),
                },
            )
            .await?;
        }

        let day = now.date_naive();
        let sequence: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(CAST(substr(receipt_number, 10) AS INTEGER)), 0) + 1
            FROM sales
            WHERE receipt_number LIKE ?1 || '-%'
            "#,
        )
        .bind(day.format("%Y%m%d").to_string())
        .fetch_one(&mut *tx)
        .await?;

        let sale = Sale {
            id: sale_id.clone(),
            receipt_number: receipt_number(day, sequence),
            status: SaleStatus::Completed,
            customer_id: input.customer_id.clone(),
            employee_id: employee_id.to_string(),
            cash_drawer_id: input.cash_drawer_id.clone(),
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.cents(),
            total_cents: totals.total.cents(),
            payment_method: input.payment_method,
            tendered_cents: match input.payment_method {
                PaymentMethod::Cash => input.tendered_cents,
                PaymentMethod::Card | PaymentMethod::Other => None,
            },
            change_cents: change.map(|c| c.cents()),
            points_earned,
            created_at: now,
            voided_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, receipt_number, status, customer_id, employee_id, cash_drawer_id,
                subtotal_cents, tax_cents, total_cents, payment_method,
                tendered_cents, change_cents, points_earned, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.receipt_number)
        .bind(sale.status)
        .bind(&sale.customer_id)
        .bind(&sale.employee_id)
        .bind(&sale.cash_drawer_id)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.tendered_cents)
        .bind(sale.change_cents)
        .bind(sale.points_earned)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for (line, amount) in input.items.iter().zip(&amounts) {
            let product = &products[&line.product_id];
            let item = SaleItem {
                id: new_id(),
                sale_id: sale.id.clone(),
                product_id: product.id.clone(),
                sku_snapshot: product.sku.clone(),
                name_snapshot: product.name.clone(),
                unit_price_cents: product.price_cents,
                tax_rate_bps: product.tax_rate_bps,
                quantity: line.quantity,
                line_total_cents: amount.line_total.cents(),
                tax_cents: amount.tax.cents(),
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, sku_snapshot, name_snapshot,
                    unit_price_cents, tax_rate_bps, quantity, line_total_cents, tax_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.sku_snapshot)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.tax_rate_bps)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .bind(item.tax_cents)
            .execute(&mut *tx)
            .await?;

            items.push(item);
        }

        if let (Some(customer_id), true) = (&sale.customer_id, points_earned > 0) {
            loyalty::record_in(
                &mut tx,
                &LedgerEntry {
                    customer_id: customer_id.clone(),
                    kind: LoyaltyTransactionKind::Earn,
                    points: points_earned,
                    description: Some(format!("Sale {}", sale.receipt_number)),
                    sale_id: Some(sale.id.clone()),
                    reward_id: None,
                    employee_id: Some(employee_id.to_string()),
                },
            )
            .await?;
        }

        if let (Some(drawer_id), PaymentMethod::Cash) = (&sale.cash_drawer_id, sale.payment_method) {
            if sale.total_cents > 0 {
                cash_drawer::record_in(
                    &mut tx,
                    &CashMovement {
                        drawer_id,
                        kind: DrawerTransactionKind::Sale,
                        amount_cents: sale.total_cents,
                        reason: Some(&sale.receipt_number),
                        sale_id: Some(&sale.id),
                        employee_id: Some(employee_id),
                    },
                )
                .await?;
            }
        }

        tx.commit().await?;

        info!(
            receipt = %sale.receipt_number,
            total = sale.total_cents,
            points = sale.points_earned,
            "Sale completed"
        );

        Ok(SaleDetail { sale, items })
    }

    /// Voids a completed sale and undoes its side effects.
    pub async fn void(&self, id: &str, employee_id: &str) -> DbResult<SaleDetail> {
        info!(id = %id, "Voiding sale");

        let mut tx = begin_write(&self.pool).await?;
        let sale = fetch_sale(&mut tx, id).await?;

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE sales SET status = 'voided', voided_at = ?2 WHERE id = ?1 AND status = 'completed'",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::InvalidTransition {
                entity: "sale".to_string(),
                from: "voided".to_string(),
                to: "voided".to_string(),
            }
            .into());
        }

        let items = fetch_items(&mut tx, id).await?;
        for item in &items {
            let tracked: bool =
                sqlx::query_scalar("SELECT track_inventory FROM products WHERE id = ?1")
                    .bind(&item.product_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !tracked {
                continue;
            }

            apply_change_in(
                &mut tx,
                &StockChange {
                    product_id: &item.product_id,
                    quantity_change: item.quantity,
                    reason: AdjustmentReason::Void,
                    reference_id: Some(id),
                    notes: Some(&sale.receipt_number),
                    employee_id: Some(employee_id),
                },
            )
            .await?;
        }

        if let (Some(customer_id), true) = (&sale.customer_id, sale.points_earned > 0) {
            let balance: i64 = sqlx::query_scalar(
                "SELECT points_balance FROM loyalty_accounts WHERE customer_id = ?1",
            )
            .bind(customer_id)
            .fetch_optional(&mut *tx)
            .await?
            .unwrap_or(0);

            // Points already spent stay spent.
            let reversal = sale.points_earned.min(balance);
            if reversal > 0 {
                loyalty::record_in(
                    &mut tx,
                    &LedgerEntry {
                        customer_id: customer_id.clone(),
                        kind: LoyaltyTransactionKind::Adjust,
                        points: -reversal,
                        description: Some(format!("Void of sale {}", sale.receipt_number)),
                        sale_id: Some(sale.id.clone()),
                        reward_id: None,
                        employee_id: Some(employee_id.to_string()),
                    },
                )
                .await?;
            }
        }

        if let (Some(drawer_id), PaymentMethod::Cash) = (&sale.cash_drawer_id, sale.payment_method) {
            let drawer = fetch_drawer(&mut tx, drawer_id).await?;
            if drawer.status == DrawerStatus::Open && sale.total_cents > 0 {
                cash_drawer::record_in(
                    &mut tx,
                    &CashMovement {
                        drawer_id,
                        kind: DrawerTransactionKind::Refund,
                        amount_cents: sale.total_cents,
                        reason: Some(&sale.receipt_number),
                        sale_id: Some(&sale.id),
                        employee_id: Some(employee_id),
                    },
                )
                .await?;
            } else {
                debug!(drawer_id = %drawer_id, "Drawer no longer open; no refund movement");
            }
        }

        let sale = fetch_sale(&mut tx, id).await?;
        tx.commit().await?;

        info!(receipt = %sale.receipt_number, "Sale voided");
        Ok(SaleDetail { sale, items })
    }

    /// Lists sales newest first.
    pub async fn list(&self, filter: &SaleFilter, page: Page) -> DbResult<Vec<Sale>> {
        let sql = format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE (?1 IS NULL OR created_at >= ?1)
              AND (?2 IS NULL OR created_at < ?2)
              AND (?3 IS NULL OR customer_id = ?3)
              AND (?4 IS NULL OR status = ?4)
            ORDER BY created_at DESC, receipt_number DESC
            LIMIT ?5 OFFSET ?6
            "#
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(filter.from)
            .bind(filter.to)
            .bind(&filter.customer_id)
            .bind(filter.status)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Gets a sale with its items.
    pub async fn get_detail(&self, id: &str) -> DbResult<SaleDetail> {
        let mut conn = self.pool.acquire().await?;
        let sale = fetch_sale(&mut conn, id).await?;
        let items = fetch_items(&mut conn, id).await?;
        Ok(SaleDetail { sale, items })
    }
}

async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Product> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

    sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
}

async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Sale> {
    let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

    sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))
}

async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid");

    let items = sqlx::query_as::<_, SaleItem>(&sql)
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(items)
}

// =============================================================================
// Tests
// =============================================================================

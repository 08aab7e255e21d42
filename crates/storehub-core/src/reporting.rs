//! # Reporting
//!
//! Aggregations behind the compliance reports. The database layer fetches
//! raw rows for a period; everything here is pure folding over slices.
//!
//! ## Report Map
//! ```text
//! ┌───────────────────────┬──────────────────────────┬────────────────────────┐
//! │ Report                │ Input rows               │ Groups by              │
//! ├───────────────────────┼──────────────────────────┼────────────────────────┤
//! │ sales summary         │ Sale                     │ payment method, day    │
//! │ tax                   │ SaleItem (completed)     │ tax rate               │
//! │ inventory valuation   │ ValuationRow             │ product                │
//! │ inventory adjustments │ InventoryAdjustment      │ reason                 │
//! │ cash variance         │ CashDrawer (closed)      │ drawer                 │
//! │ loyalty liability     │ LoyaltyAccount           │ tier                   │
//! │ top products          │ SaleItem (completed)     │ product                │
//! └───────────────────────┴──────────────────────────┴────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::loyalty::points_value_cents;
use crate::types::{
    AdjustmentReason, CashDrawer, InventoryAdjustment, LoyaltyAccount, LoyaltyTier,
    PaymentMethod, Sale, SaleItem, SaleStatus,
};

// =============================================================================
// Period
// =============================================================================

/// Inclusive-exclusive time window `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportPeriod {
    #[ts(as = "String")]
    pub from: DateTime<Utc>,
    #[ts(as = "String")]
    pub to: DateTime<Utc>,
}

impl ReportPeriod {
    /// Fills in defaults: `to` = now, `from` = `to` minus
    /// [`crate::DEFAULT_REPORT_DAYS`].
    pub fn resolve(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let to = to.unwrap_or(now);
        let from = from.unwrap_or(to - Duration::days(crate::DEFAULT_REPORT_DAYS));

        if from > to {
            return Err(ValidationError::invalid_format(
                "from",
                "must not be after `to`",
            ));
        }

        Ok(ReportPeriod { from, to })
    }
}

// =============================================================================
// Sales Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentMethodTotal {
    pub payment_method: PaymentMethod,
    pub sale_count: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyTotal {
    /// `YYYY-MM-DD` in UTC.
    pub day: String,
    pub sale_count: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub sale_count: i64,
    /// Σ total (tax included).
    pub gross_cents: i64,
    pub tax_cents: i64,
    /// gross − tax.
    pub net_cents: i64,
    pub average_ticket_cents: i64,
    pub void_count: i64,
    pub voided_total_cents: i64,
    pub by_payment_method: Vec<PaymentMethodTotal>,
    pub by_day: Vec<DailyTotal>,
}

/// Summarises sales. Voided sales are only counted in the void fields.
pub fn summarize_sales(sales: &[Sale]) -> SalesSummary {
    let mut summary = SalesSummary::default();
    let mut by_method: BTreeMap<&'static str, PaymentMethodTotal> = BTreeMap::new();
    let mut by_day: BTreeMap<String, DailyTotal> = BTreeMap::new();

    for sale in sales {
        if sale.status == SaleStatus::Voided {
            summary.void_count += 1;
            summary.voided_total_cents += sale.total_cents;
            continue;
        }

        summary.sale_count += 1;
        summary.gross_cents += sale.total_cents;
        summary.tax_cents += sale.tax_cents;

        let method = by_method
            .entry(sale.payment_method.as_str())
            .or_insert_with(|| PaymentMethodTotal {
                payment_method: sale.payment_method,
                sale_count: 0,
                total_cents: 0,
            });
        method.sale_count += 1;
        method.total_cents += sale.total_cents;

        let day = sale.created_at.format("%Y-%m-%d").to_string();
        let daily = by_day.entry(day.clone()).or_insert_with(|| DailyTotal {
            day,
            sale_count: 0,
            total_cents: 0,
        });
        daily.sale_count += 1;
        daily.total_cents += sale.total_cents;
    }

    summary.net_cents = summary.gross_cents - summary.tax_cents;
    if summary.sale_count > 0 {
        summary.average_ticket_cents = summary.gross_cents / summary.sale_count;
    }
    summary.by_payment_method = by_method.into_values().collect();
    summary.by_day = by_day.into_values().collect();
    summary
}

// =============================================================================
// Tax
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRateTotal {
    pub tax_rate_bps: u32,
    pub line_count: i64,
    pub taxable_cents: i64,
    pub tax_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxReport {
    pub rates: Vec<TaxRateTotal>,
    pub taxable_cents: i64,
    pub tax_cents: i64,
}

/// Groups sale lines by tax rate. Callers pass lines of completed sales only.
pub fn tax_report(items: &[SaleItem]) -> TaxReport {
    let mut rates: BTreeMap<u32, TaxRateTotal> = BTreeMap::new();

    for item in items {
        let rate = rates.entry(item.tax_rate_bps).or_insert(TaxRateTotal {
            tax_rate_bps: item.tax_rate_bps,
            line_count: 0,
            taxable_cents: 0,
            tax_cents: 0,
        });
        rate.line_count += 1;
        rate.taxable_cents += item.line_total_cents;
        rate.tax_cents += item.tax_cents;
    }

    let rates: Vec<TaxRateTotal> = rates.into_values().collect();
    TaxReport {
        taxable_cents: rates.iter().map(|r| r.taxable_cents).sum(),
        tax_cents: rates.iter().map(|r| r.tax_cents).sum(),
        rates,
    }
}

// =============================================================================
// Inventory Valuation
// =============================================================================

/// One product's stock as read for valuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ValuationRow {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub cost_cents: Option<i64>,
    pub price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValuationLine {
    #[serde(flatten)]
    pub row: ValuationRow,
    /// quantity × cost; products without a cost count as zero.
    pub cost_value_cents: i64,
    pub retail_value_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryValuation {
    pub lines: Vec<ValuationLine>,
    pub total_units: i64,
    pub total_cost_cents: i64,
    pub total_retail_cents: i64,
    /// Products with stock but no recorded cost.
    pub uncosted_products: i64,
}

/// Values stock on hand. Negative quantities are valued at zero.
pub fn inventory_valuation(rows: Vec<ValuationRow>) -> InventoryValuation {
    let mut report = InventoryValuation::default();

    for row in rows {
        let units = row.quantity.max(0);
        let cost_value_cents = units * row.cost_cents.unwrap_or(0);
        let retail_value_cents = units * row.price_cents;

        if units > 0 && row.cost_cents.is_none() {
            report.uncosted_products += 1;
        }

        report.total_units += units;
        report.total_cost_cents += cost_value_cents;
        report.total_retail_cents += retail_value_cents;
        report.lines.push(ValuationLine {
            row,
            cost_value_cents,
            retail_value_cents,
        });
    }

    report
}

// =============================================================================
// Inventory Adjustments
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReasonTotal {
    pub reason: AdjustmentReason,
    pub count: i64,
    pub units_added: i64,
    pub units_removed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AdjustmentReport {
    pub adjustments: Vec<InventoryAdjustment>,
    pub by_reason: Vec<ReasonTotal>,
}

/// Audit rows plus per-reason totals.
pub fn adjustment_report(adjustments: Vec<InventoryAdjustment>) -> AdjustmentReport {
    let mut by_reason: BTreeMap<&'static str, ReasonTotal> = BTreeMap::new();

    for adj in &adjustments {
        let total = by_reason
            .entry(adj.reason.as_str())
            .or_insert_with(|| ReasonTotal {
                reason: adj.reason,
                count: 0,
                units_added: 0,
                units_removed: 0,
            });
        total.count += 1;
        if adj.quantity_change >= 0 {
            total.units_added += adj.quantity_change;
        } else {
            total.units_removed += -adj.quantity_change;
        }
    }

    AdjustmentReport {
        adjustments,
        by_reason: by_reason.into_values().collect(),
    }
}

// =============================================================================
// Cash Variance
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashVarianceReport {
    pub drawers: Vec<CashDrawer>,
    pub total_variance_cents: i64,
    pub over_count: i64,
    pub short_count: i64,
    pub balanced_count: i64,
}

/// Variance across closed sessions. Drawers without a variance are skipped.
pub fn cash_variance(drawers: Vec<CashDrawer>) -> CashVarianceReport {
    let mut report = CashVarianceReport::default();

    for drawer in drawers {
        let Some(variance) = drawer.variance_cents else {
            continue;
        };

        report.total_variance_cents += variance;
        match variance {
            v if v > 0 => report.over_count += 1,
            v if v < 0 => report.short_count += 1,
            _ => report.balanced_count += 1,
        }
        report.drawers.push(drawer);
    }

    report
}

// =============================================================================
// Loyalty Liability
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TierTotal {
    pub tier: LoyaltyTier,
    pub accounts: i64,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoyaltyLiability {
    pub account_count: i64,
    pub outstanding_points: i64,
    pub point_value_cents: i64,
    pub liability_cents: i64,
    /// Every tier, including empty ones.
    pub by_tier: Vec<TierTotal>,
}

pub fn loyalty_liability(accounts: &[LoyaltyAccount], point_value_cents: i64) -> LoyaltyLiability {
    let mut by_tier: HashMap<LoyaltyTier, TierTotal> = LoyaltyTier::ALL
        .iter()
        .map(|&tier| {
            (
                tier,
                TierTotal {
                    tier,
                    accounts: 0,
                    points: 0,
                },
            )
        })
        .collect();

    let mut outstanding_points = 0;
    for account in accounts {
        outstanding_points += account.points_balance;
        if let Some(total) = by_tier.get_mut(&account.tier) {
            total.accounts += 1;
            total.points += account.points_balance;
        }
    }

    let by_tier = LoyaltyTier::ALL
        .iter()
        .filter_map(|tier| by_tier.remove(tier))
        .collect();

    LoyaltyLiability {
        account_count: accounts.len() as i64,
        outstanding_points,
        point_value_cents,
        liability_cents: points_value_cents(outstanding_points, point_value_cents),
        by_tier,
    }
}

// =============================================================================
// Top Products
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSales {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    /// Pre-tax revenue.
    pub revenue_cents: i64,
}

/// Best sellers by quantity, ties broken by revenue then sku.
pub fn top_products(items: &[SaleItem], limit: usize) -> Vec<ProductSales> {
    let mut by_product: HashMap<&str, ProductSales> = HashMap::new();

    for item in items {
        let entry = by_product
            .entry(item.product_id.as_str())
            .or_insert_with(|| ProductSales {
                product_id: item.product_id.clone(),
                sku: item.sku_snapshot.clone(),
                name: item.name_snapshot.clone(),
                quantity: 0,
                revenue_cents: 0,
            });
        entry.quantity += item.quantity;
        entry.revenue_cents += item.line_total_cents;
    }

    let mut ranked: Vec<ProductSales> = by_product.into_values().collect();
    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then(b.revenue_cents.cmp(&a.revenue_cents))
            .then(a.sku.cmp(&b.sku))
    });
    ranked.truncate(limit);
    ranked
}

// =============================================================================
// Unit Tests
// =============================================================================

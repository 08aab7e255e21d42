//! Catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::TaxRate;
use crate::money::Money;

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    pub description: Option<String>,

    /// Free-form grouping used by list filters ("Beverages", "Snacks").
    pub category: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Cost in cents (for valuation reports).
    pub cost_cents: Option<i64>,

    /// Tax rate in basis points (825 = 8.25%).
    pub tax_rate_bps: u32,

    /// Whether to track inventory for this product.
    pub track_inventory: bool,

    /// Allow selling when stock is zero or negative.
    pub allow_negative_stock: bool,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Checks if `quantity` units can be sold given `on_hand` stock.
    pub fn can_sell(&self, on_hand: i64, quantity: i64) -> bool {
        if !self.track_inventory {
            return true;
        }

        on_hand >= quantity || self.allow_negative_stock
    }
}

/// Input for creating a product. `initial_quantity` seeds the inventory level.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
    #[serde(default)]
    pub tax_rate_bps: u32,
    #[serde(default = "default_true")]
    pub track_inventory: bool,
    #[serde(default)]
    pub allow_negative_stock: bool,
    #[serde(default)]
    pub initial_quantity: i64,
    #[serde(default)]
    pub reorder_level: i64,
    pub location: Option<String>,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub cost_cents: Option<i64>,
    pub tax_rate_bps: Option<u32>,
    pub track_inventory: Option<bool>,
    pub allow_negative_stock: Option<bool>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    /// Applies the update to a product in place.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(sku) = &self.sku {
            product.sku = sku.trim().to_string();
        }
        if let Some(barcode) = &self.barcode {
            product.barcode = non_empty(barcode);
        }
        if let Some(name) = &self.name {
            product.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            product.description = non_empty(description);
        }
        if let Some(category) = &self.category {
            product.category = non_empty(category);
        }
        if let Some(price) = self.price_cents {
            product.price_cents = price;
        }
        if let Some(cost) = self.cost_cents {
            product.cost_cents = Some(cost);
        }
        if let Some(bps) = self.tax_rate_bps {
            product.tax_rate_bps = bps;
        }
        if let Some(track) = self.track_inventory {
            product.track_inventory = track;
        }
        if let Some(allow) = self.allow_negative_stock {
            product.allow_negative_stock = allow;
        }
        if let Some(active) = self.is_active {
            product.is_active = active;
        }
    }
}

/// Empty strings clear optional text columns.
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(track: bool, allow_negative: bool) -> Product {
        let now = Utc::now();
        Product {
            id: "p1".into(),
            sku: "COKE-330".into(),
            barcode: None,
            name: "Coca-Cola 330ml".into(),
            description: None,
            category: None,
            price_cents: 199,
            cost_cents: Some(80),
            tax_rate_bps: 825,
            track_inventory: track,
            allow_negative_stock: allow_negative,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_can_sell() {
        assert!(product(true, false).can_sell(5, 5));
        assert!(!product(true, false).can_sell(4, 5));
        assert!(product(true, true).can_sell(0, 5));
        assert!(product(false, false).can_sell(0, 5));
    }

    #[test]
    fn test_update_applies_only_given_fields() {
        let mut p = product(true, false);
        let update = ProductUpdate {
            price_cents: Some(249),
            barcode: Some("  ".into()),
            ..Default::default()
        };
        update.apply_to(&mut p);

        assert_eq!(p.price_cents, 249);
        assert_eq!(p.barcode, None);
        assert_eq!(p.name, "Coca-Cola 330ml");
    }
}

//! Stock level and adjustment types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Current stock for one product, joined with the product's sku and name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryLevel {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub reorder_level: i64,
    pub location: Option<String>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryLevel {
    /// At or below the reorder point.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

/// Why a quantity changed. Recorded on every adjustment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AdjustmentReason {
    Received,
    Sale,
    Void,
    Damaged,
    Shrinkage,
    CountCorrection,
    Return,
    Other,
}

impl AdjustmentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentReason::Received => "received",
            AdjustmentReason::Sale => "sale",
            AdjustmentReason::Void => "void",
            AdjustmentReason::Damaged => "damaged",
            AdjustmentReason::Shrinkage => "shrinkage",
            AdjustmentReason::CountCorrection => "count_correction",
            AdjustmentReason::Return => "return",
            AdjustmentReason::Other => "other",
        }
    }

    /// Reasons a person may pick on the manual adjustment screen.
    ///
    /// `sale`, `void` and `received` are written by their own workflows.
    pub fn is_manual(&self) -> bool {
        !matches!(
            self,
            AdjustmentReason::Sale | AdjustmentReason::Void | AdjustmentReason::Received
        )
    }
}

/// Append-only audit row for a stock change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryAdjustment {
    pub id: String,
    pub product_id: String,
    pub quantity_change: i64,
    pub quantity_after: i64,
    pub reason: AdjustmentReason,
    /// Sale or purchase order id that caused the change.
    pub reference_id: Option<String>,
    pub notes: Option<String>,
    pub employee_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Request body for a manual adjustment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AdjustInventory {
    pub product_id: String,
    pub quantity_change: i64,
    pub reason: AdjustmentReason,
    pub notes: Option<String>,
}

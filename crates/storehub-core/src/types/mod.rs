//! # Domain Types
//!
//! Core domain types used throughout StoreHub.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog            Stock               Purchasing                     │
//! │  ─────────────      ─────────────       ──────────────────             │
//! │  Product            InventoryLevel      Supplier                       │
//! │  TaxRate            InventoryAdjustment PurchaseOrder (+Item)          │
//! │                     AdjustmentReason    PurchaseOrderStatus            │
//! │                                                                         │
//! │  People             Selling             Loyalty                        │
//! │  ─────────────      ─────────────       ──────────────────             │
//! │  Employee / Role    Sale (+Item)        LoyaltyAccount / Tier          │
//! │  Customer           PaymentMethod       LoyaltyTransaction / Reward    │
//! │                     CashDrawer (+Txn)                                  │
//! │                                                                         │
//! │  Notifications: EmailTemplate, EmailLog                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity has a UUID v4 `id` (string form). Business identifiers
//! (sku, po_number, receipt_number) are separate, human-readable columns.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod cash_drawer;
pub mod customer;
pub mod email;
pub mod employee;
pub mod inventory;
pub mod loyalty;
pub mod product;
pub mod purchase_order;
pub mod sale;
pub mod supplier;

pub use cash_drawer::*;
pub use customer::*;
pub use email::*;
pub use employee::*;
pub use inventory::*;
pub use loyalty::*;
pub use product::*;
pub use purchase_order::*;
pub use sale::*;
pub use supplier::*;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 825 bps = 8.25%
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Paging
// =============================================================================

/// Limit/offset window for list endpoints.
///
/// Clamped on construction so repositories never see an unbounded query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Page {
            limit: limit
                .unwrap_or(crate::DEFAULT_PAGE_SIZE)
                .clamp(1, crate::MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

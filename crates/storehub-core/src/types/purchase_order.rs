//! Purchase order types and their status machine.
//!
//! ```text
//!   draft ──► submitted ──► partially_received ──► received
//!     │           │                                   ▲
//!     │           └───────────────────────────────────┘
//!     ▼           ▼
//!  cancelled ◄────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PurchaseOrderStatus {
    Draft,
    Submitted,
    PartiallyReceived,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Draft => "draft",
            PurchaseOrderStatus::Submitted => "submitted",
            PurchaseOrderStatus::PartiallyReceived => "partially_received",
            PurchaseOrderStatus::Received => "received",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whitelisted status changes.
    pub fn can_transition_to(&self, next: PurchaseOrderStatus) -> bool {
        use PurchaseOrderStatus::*;
        matches!(
            (self, next),
            (Draft, Submitted)
                | (Draft, Cancelled)
                | (Submitted, PartiallyReceived)
                | (Submitted, Received)
                | (Submitted, Cancelled)
                | (PartiallyReceived, Received)
        )
    }

    /// Goods can only be booked in against an order the supplier has.
    pub fn accepts_receipts(&self) -> bool {
        matches!(
            self,
            PurchaseOrderStatus::Submitted | PurchaseOrderStatus::PartiallyReceived
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseOrder {
    pub id: String,
    /// Human-readable number: `PO-YYYYMMDD-XXXX`.
    pub po_number: String,
    pub supplier_id: String,
    pub status: PurchaseOrderStatus,
    #[ts(as = "Option<String>")]
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub total_cost_cents: i64,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseOrderItem {
    pub id: String,
    pub purchase_order_id: String,
    pub product_id: String,
    pub quantity_ordered: i64,
    pub quantity_received: i64,
    pub unit_cost_cents: i64,
    pub line_total_cents: i64,
}

impl PurchaseOrderItem {
    #[inline]
    pub fn outstanding(&self) -> i64 {
        (self.quantity_ordered - self.quantity_received).max(0)
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.quantity_received >= self.quantity_ordered
    }
}

/// Order together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPurchaseOrderItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPurchaseOrder {
    pub supplier_id: String,
    #[ts(as = "Option<String>")]
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub items: Vec<NewPurchaseOrderItem>,
}

impl NewPurchaseOrder {
    /// Sum of quantity × unit cost over all lines.
    pub fn total_cost(&self) -> Money {
        self.items
            .iter()
            .map(|i| Money::from_cents(i.unit_cost_cents).multiply_quantity(i.quantity))
            .sum()
    }
}

/// One line of a receiving request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiveLine {
    pub item_id: String,
    pub quantity_received: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use PurchaseOrderStatus::*;

    #[test]
    fn test_status_whitelist() {
        assert!(Draft.can_transition_to(Submitted));
        assert!(Draft.can_transition_to(Cancelled));
        assert!(Submitted.can_transition_to(Received));
        assert!(PartiallyReceived.can_transition_to(Received));

        assert!(!Draft.can_transition_to(Received));
        assert!(!Received.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Draft));
        assert!(!PartiallyReceived.can_transition_to(Cancelled));
    }

    #[test]
    fn test_outstanding() {
        let item = PurchaseOrderItem {
            id: "i".into(),
            purchase_order_id: "po".into(),
            product_id: "p".into(),
            quantity_ordered: 10,
            quantity_received: 4,
            unit_cost_cents: 100,
            line_total_cents: 1000,
        };
        assert_eq!(item.outstanding(), 6);
        assert!(!item.is_complete());
    }

    #[test]
    fn test_total_cost() {
        let po = NewPurchaseOrder {
            supplier_id: "s".into(),
            expected_date: None,
            notes: None,
            items: vec![
                NewPurchaseOrderItem { product_id: "a".into(), quantity: 3, unit_cost_cents: 150 },
                NewPurchaseOrderItem { product_id: "b".into(), quantity: 2, unit_cost_cents: 1000 },
            ],
        };
        assert_eq!(po.total_cost().cents(), 2450);
    }
}

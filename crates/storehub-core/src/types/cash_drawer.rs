//! Cash drawer session types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Drawer session lifecycle.
///
/// ```text
///  open ──► counting ──► closed ──► reconciled
///    ▲          │
///    └──────────┘  (recount)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DrawerStatus {
    Open,
    Counting,
    Closed,
    Reconciled,
}

impl DrawerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawerStatus::Open => "open",
            DrawerStatus::Counting => "counting",
            DrawerStatus::Closed => "closed",
            DrawerStatus::Reconciled => "reconciled",
        }
    }

    /// Statuses that still occupy the register.
    pub fn is_active(&self) -> bool {
        matches!(self, DrawerStatus::Open | DrawerStatus::Counting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DrawerTransactionKind {
    CashIn,
    CashOut,
    Sale,
    Refund,
}

impl DrawerTransactionKind {
    /// +1 for money entering the drawer, -1 for money leaving.
    pub fn sign(&self) -> i64 {
        match self {
            DrawerTransactionKind::CashIn | DrawerTransactionKind::Sale => 1,
            DrawerTransactionKind::CashOut | DrawerTransactionKind::Refund => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashDrawer {
    pub id: String,
    pub register_name: String,
    pub employee_id: String,
    pub status: DrawerStatus,
    pub opening_balance_cents: i64,
    pub expected_balance_cents: i64,
    pub counted_balance_cents: Option<i64>,
    /// counted − expected, set on close.
    pub variance_cents: Option<i64>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DrawerTransaction {
    pub id: String,
    pub drawer_id: String,
    pub kind: DrawerTransactionKind,
    /// Signed: negative for cash leaving the drawer.
    pub amount_cents: i64,
    pub balance_after: i64,
    pub reason: Option<String>,
    pub sale_id: Option<String>,
    pub employee_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashDrawerDetail {
    #[serde(flatten)]
    pub drawer: CashDrawer,
    pub transactions: Vec<DrawerTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OpenDrawer {
    pub register_name: String,
    pub opening_balance_cents: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewDrawerTransaction {
    pub kind: DrawerTransactionKind,
    /// Unsigned amount; the kind decides the direction.
    pub amount_cents: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DrawerStatusChange {
    pub status: DrawerStatus,
    pub counted_balance_cents: Option<i64>,
    pub notes: Option<String>,
}

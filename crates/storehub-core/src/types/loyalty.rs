//! Loyalty account, ledger and rewards catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Membership tier, derived from lifetime points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyTier {
    pub const ALL: [LoyaltyTier; 4] = [
        LoyaltyTier::Bronze,
        LoyaltyTier::Silver,
        LoyaltyTier::Gold,
        LoyaltyTier::Platinum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoyaltyTier::Bronze => "bronze",
            LoyaltyTier::Silver => "silver",
            LoyaltyTier::Gold => "gold",
            LoyaltyTier::Platinum => "platinum",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LoyaltyAccount {
    pub customer_id: String,
    pub points_balance: i64,
    pub lifetime_points: i64,
    pub tier: LoyaltyTier,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum LoyaltyTransactionKind {
    Earn,
    Redeem,
    Adjust,
}

/// Append-only ledger row. `points` is signed: redeems are negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LoyaltyTransaction {
    pub id: String,
    pub customer_id: String,
    pub kind: LoyaltyTransactionKind,
    pub points: i64,
    pub balance_after: i64,
    pub description: Option<String>,
    pub sale_id: Option<String>,
    pub reward_id: Option<String>,
    pub employee_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /api/loyalty/transactions`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLoyaltyTransaction {
    pub customer_id: String,
    pub kind: LoyaltyTransactionKind,
    pub points: i64,
    pub description: Option<String>,
}

/// Everything the ledger writer needs, after the caller has resolved sign
/// and references.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub customer_id: String,
    pub kind: LoyaltyTransactionKind,
    /// Signed delta applied to the balance.
    pub points: i64,
    pub description: Option<String>,
    pub sale_id: Option<String>,
    pub reward_id: Option<String>,
    pub employee_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Reward {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub points_cost: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewReward {
    pub name: String,
    pub description: Option<String>,
    pub points_cost: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RewardUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub points_cost: Option<i64>,
    pub is_active: Option<bool>,
}

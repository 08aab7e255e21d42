//! # Loyalty Repository
//!
//! Points ledger and rewards catalog.
//!
//! ## Ledger Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_in(conn, LedgerEntry{points: Δ})                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE loyalty_accounts                                               │
//! │     SET points_balance = points_balance + Δ,                           │
//! │         lifetime_points = lifetime_points + max(Δ, 0) for earn/adjust  │
//! │   WHERE customer_id = ? AND points_balance + Δ >= 0                    │
//! │   RETURNING points_balance, lifetime_points                            │
//! │       │                                                                 │
//! │       ├── no row ──► NotFound / InsufficientPoints                     │
//! │       ├── tier = tier_for(lifetime_points)                             │
//! │       ▼                                                                 │
//! │  INSERT loyalty_transactions (Δ, balance_after)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use storehub_core::loyalty::{lifetime_increment, signed_delta, tier_for};
use storehub_core::{
    CoreError, LedgerEntry, LoyaltyAccount, LoyaltyTransaction, LoyaltyTransactionKind,
    NewLoyaltyTransaction, NewReward, Page, Reward, RewardUpdate,
};
use tracing::{debug, info};

use super::{begin_write, clean, new_id};
use crate::error::{DbError, DbResult};

const ACCOUNT_COLUMNS: &str =
    "customer_id, points_balance, lifetime_points, tier, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "id, customer_id, kind, points, balance_after, description, \
     sale_id, reward_id, employee_id, created_at";

const REWARD_COLUMNS: &str = "id, name, description, points_cost, is_active, created_at, updated_at";

/// A ledger row together with the account it left behind.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerOutcome {
    pub transaction: LoyaltyTransaction,
    pub account: LoyaltyAccount,
}

/// Writes one ledger row and moves the balance, on an open connection or
/// transaction.
///
/// ## Returns
/// * `Err(DbError::NotFound)` - the customer has no loyalty account
/// * `Err(CoreError::InsufficientPoints)` - the balance would go negative
pub(crate) async fn record_in(
    conn: &mut SqliteConnection,
    entry: &LedgerEntry,
) -> DbResult<LedgerOutcome> {
    let now = Utc::now();
    let lifetime = lifetime_increment(entry.kind, entry.points);

    let updated: Option<(i64, i64)> = sqlx::query_as(
        r#"
        UPDATE loyalty_accounts
        SET points_balance = points_balance + ?1,
            lifetime_points = lifetime_points + ?2,
            updated_at = ?3
        WHERE customer_id = ?4 AND points_balance + ?1 >= 0
        RETURNING points_balance, lifetime_points
        "#,
    )
    .bind(entry.points)
    .bind(lifetime)
    .bind(now)
    .bind(&entry.customer_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some((balance_after, lifetime_points)) = updated else {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT points_balance FROM loyalty_accounts WHERE customer_id = ?1")
                .bind(&entry.customer_id)
                .fetch_optional(&mut *conn)
                .await?;

        return Err(match balance {
            Some(balance) => CoreError::InsufficientPoints {
                balance,
                requested: entry.points.saturating_neg(),
            }
            .into(),
            None => DbError::not_found("Loyalty account", &entry.customer_id),
        });
    };

    sqlx::query("UPDATE loyalty_accounts SET tier = ?2 WHERE customer_id = ?1")
        .bind(&entry.customer_id)
        .bind(tier_for(lifetime_points))
        .execute(&mut *conn)
        .await?;

    let transaction = LoyaltyTransaction {
        id: new_id(),
        customer_id: entry.customer_id.clone(),
        kind: entry.kind,
        points: entry.points,
        balance_after,
        description: clean(entry.description.as_deref()),
        sale_id: entry.sale_id.clone(),
        reward_id: entry.reward_id.clone(),
        employee_id: entry.employee_id.clone(),
        created_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO loyalty_transactions (
            id, customer_id, kind, points, balance_after, description,
            sale_id, reward_id, employee_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.customer_id)
    .bind(transaction.kind)
    .bind(transaction.points)
    .bind(transaction.balance_after)
    .bind(&transaction.description)
    .bind(&transaction.sale_id)
    .bind(&transaction.reward_id)
    .bind(&transaction.employee_id)
    .bind(transaction.created_at)
    .execute(&mut *conn)
    .await?;

    let account = fetch_account(conn, &entry.customer_id).await?;

    debug!(
        customer_id = %entry.customer_id,
        points = entry.points,
        balance_after,
        tier = account.tier.as_str(),
        "Loyalty ledger row written"
    );

    Ok(LedgerOutcome {
        transaction,
        account,
    })
}

async fn fetch_account(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<LoyaltyAccount> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM loyalty_accounts WHERE customer_id = ?1");

    sqlx::query_as::<_, LoyaltyAccount>(&sql)
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Loyalty account", customer_id))
}

/// Fails unless the customer exists and is active.
pub(crate) async fn ensure_active_customer(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> DbResult<()> {
    let active: Option<bool> = sqlx::query_scalar("SELECT is_active FROM customers WHERE id = ?1")
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?;

    match active {
        Some(true) => Ok(()),
        Some(false) => Err(CoreError::Inactive {
            entity: "Customer".to_string(),
            id: customer_id.to_string(),
        }
        .into()),
        None => Err(DbError::not_found("Customer", customer_id)),
    }
}

#[derive(Debug, Clone)]
pub struct LoyaltyRepository {
    pool: SqlitePool,
}

impl LoyaltyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LoyaltyRepository { pool }
    }

    pub async fn account(&self, customer_id: &str) -> DbResult<LoyaltyAccount> {
        let mut conn = self.pool.acquire().await?;
        fetch_account(&mut conn, customer_id).await
    }

    /// Records a manual earn, redeem or adjust.
    pub async fn record(
        &self,
        input: &NewLoyaltyTransaction,
        employee_id: Option<&str>,
    ) -> DbResult<LedgerOutcome> {
        let points = signed_delta(input.kind, input.points)?;

        info!(
            customer_id = %input.customer_id,
            kind = ?input.kind,
            points,
            "Recording loyalty transaction"
        );

        let mut tx = begin_write(&self.pool).await?;
        ensure_active_customer(&mut tx, &input.customer_id).await?;

        let outcome = record_in(
            &mut tx,
            &LedgerEntry {
                customer_id: input.customer_id.clone(),
                kind: input.kind,
                points,
                description: input.description.clone(),
                sale_id: None,
                reward_id: None,
                employee_id: employee_id.map(str::to_string),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(outcome)
    }

    /// Ledger rows newest first. `None` returns every customer's rows.
    pub async fn transactions(
        &self,
        customer_id: Option<&str>,
        page: Page,
    ) -> DbResult<Vec<LoyaltyTransaction>> {
        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM loyalty_transactions
            WHERE (?1 IS NULL OR customer_id = ?1)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "#
        );

        let rows = sqlx::query_as::<_, LoyaltyTransaction>(&sql)
            .bind(customer_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    // -------------------------------------------------------------------------
    // Rewards
    // -------------------------------------------------------------------------

    pub async fn rewards(&self, include_inactive: bool) -> DbResult<Vec<Reward>> {
        let sql = format!(
            "SELECT {REWARD_COLUMNS} FROM rewards WHERE ?1 = 1 OR is_active = 1 ORDER BY points_cost, name"
        );

        let rewards = sqlx::query_as::<_, Reward>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        Ok(rewards)
    }

    pub async fn reward(&self, id: &str) -> DbResult<Reward> {
        let sql = format!("SELECT {REWARD_COLUMNS} FROM rewards WHERE id = ?1");

        sqlx::query_as::<_, Reward>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Reward", id))
    }

    pub async fn create_reward(&self, input: &NewReward) -> DbResult<Reward> {
        let now = Utc::now();
        let reward = Reward {
            id: new_id(),
            name: input.name.trim().to_string(),
            description: clean(input.description.as_deref()),
            points_cost: input.points_cost,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO rewards (id, name, description, points_cost, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&reward.id)
        .bind(&reward.name)
        .bind(&reward.description)
        .bind(reward.points_cost)
        .bind(reward.is_active)
        .bind(reward.created_at)
        .bind(reward.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(reward)
    }

    pub async fn update_reward(&self, id: &str, update: &RewardUpdate) -> DbResult<Reward> {
        let mut reward = self.reward(id).await?;
        if let Some(name) = &update.name {
            reward.name = name.trim().to_string();
        }
        if let Some(description) = &update.description {
            reward.description = clean(Some(description));
        }
        if let Some(cost) = update.points_cost {
            reward.points_cost = cost;
        }
        if let Some(active) = update.is_active {
            reward.is_active = active;
        }
        reward.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE rewards SET name = ?2, description = ?3, points_cost = ?4, is_active = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&reward.id)
        .bind(&reward.name)
        .bind(&reward.description)
        .bind(reward.points_cost)
        .bind(reward.is_active)
        .bind(reward.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(reward)
    }

    /// Rewards are retired, never removed; redeemed rows reference them.
    pub async fn deactivate_reward(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE rewards SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Reward", id));
        }
        Ok(())
    }

    /// Redeems an active reward for a customer: one `redeem` row for the
    /// reward's cost, referencing the reward.
    pub async fn redeem_reward(
        &self,
        reward_id: &str,
        customer_id: &str,
        employee_id: Option<&str>,
    ) -> DbResult<LedgerOutcome> {
        let mut tx = begin_write(&self.pool).await?;

        let sql = format!("SELECT {REWARD_COLUMNS} FROM rewards WHERE id = ?1");
        let reward = sqlx::query_as::<_, Reward>(&sql)
            .bind(reward_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Reward", reward_id))?;

        if !reward.is_active {
            return Err(CoreError::Inactive {
                entity: "Reward".to_string(),
                id: reward.id,
            }
            .into());
        }

        ensure_active_customer(&mut tx, customer_id).await?;

        info!(reward = %reward.name, customer_id = %customer_id, cost = reward.points_cost, "Redeeming reward");

        let outcome = record_in(
            &mut tx,
            &LedgerEntry {
                customer_id: customer_id.to_string(),
                kind: LoyaltyTransactionKind::Redeem,
                points: signed_delta(LoyaltyTransactionKind::Redeem, reward.points_cost)?,
                description: Some(format!("Redeemed: {}", reward.name)),
                sale_id: None,
                reward_id: Some(reward.id.clone()),
                employee_id: employee_id.map(str::to_string),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(outcome)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{customer, db};
    use storehub_core::LoyaltyTier;

    fn txn(customer_id: &str, kind: LoyaltyTransactionKind, points: i64) -> NewLoyaltyTransaction {
        NewLoyaltyTransaction {
            customer_id: customer_id.to_string(),
            kind,
            points,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_earn_and_redeem() {
        let db = db().await;
        let c = customer(&db, "Ana").await;
        let repo = db.loyalty();

        let earned = repo.record(&txn(&c.id, LoyaltyTransactionKind::Earn, 600), None).await.unwrap();
        assert_eq!(earned.transaction.balance_after, 600);
        assert_eq!(earned.account.lifetime_points, 600);
        assert_eq!(earned.account.tier, LoyaltyTier::Silver);

        let redeemed = repo.record(&txn(&c.id, LoyaltyTransactionKind::Redeem, 100), None).await.unwrap();
        assert_eq!(redeemed.transaction.points, -100);
        assert_eq!(redeemed.account.points_balance, 500);
        // Redeeming never lowers lifetime points or tier.
        assert_eq!(redeemed.account.lifetime_points, 600);
        assert_eq!(redeemed.account.tier, LoyaltyTier::Silver);

        let rows = repo.transactions(Some(&c.id), Page::default()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, LoyaltyTransactionKind::Redeem);
    }

    #[tokio::test]
    async fn test_insufficient_points() {
        let db = db().await;
        let c = customer(&db, "Ana").await;
        let repo = db.loyalty();
        repo.record(&txn(&c.id, LoyaltyTransactionKind::Earn, 50), None).await.unwrap();

        let err = repo
            .record(&txn(&c.id, LoyaltyTransactionKind::Redeem, 80), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientPoints { balance: 50, requested: 80 })
        ));

        let err = repo
            .record(&txn(&c.id, LoyaltyTransactionKind::Adjust, -51), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InsufficientPoints { .. })));

        assert_eq!(repo.account(&c.id).await.unwrap().points_balance, 50);
        assert_eq!(repo.transactions(Some(&c.id), Page::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_amounts() {
        let db = db().await;
        let c = customer(&db, "Ana").await;

        let err = db
            .loyalty()
            .record(&txn(&c.id, LoyaltyTransactionKind::Earn, 0), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let err = db
            .loyalty()
            .record(&txn("missing", LoyaltyTransactionKind::Earn, 5), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_redeem_reward() {
        let db = db().await;
        let c = customer(&db, "Ana").await;
        let repo = db.loyalty();
        repo.record(&txn(&c.id, LoyaltyTransactionKind::Earn, 300), None).await.unwrap();

        let coffee = repo
            .create_reward(&NewReward {
                name: "Free coffee".into(),
                description: None,
                points_cost: 120,
            })
            .await
            .unwrap();

        let outcome = repo.redeem_reward(&coffee.id, &c.id, None).await.unwrap();
        assert_eq!(outcome.account.points_balance, 180);
        assert_eq!(outcome.transaction.reward_id.as_deref(), Some(coffee.id.as_str()));

        repo.deactivate_reward(&coffee.id).await.unwrap();
        let err = repo.redeem_reward(&coffee.id, &c.id, None).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Inactive { .. })));
        assert!(repo.rewards(false).await.unwrap().is_empty());
        assert_eq!(repo.rewards(true).await.unwrap().len(), 1);
    }
}

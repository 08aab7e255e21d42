//! # Cash Drawer Repository
//!
//! Drawer sessions and the cash movements recorded against them.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  open(register, opening_balance)                                        │
//! │       │   at most one open/counting session per register               │
//! │       ▼                                                                 │
//! │  open ──── cash_in / cash_out / sale / refund ────► expected balance   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  counting ──► closed (counted balance, variance = counted − expected)  │
//! │       │                  │                                              │
//! │       └──► open          ▼                                              │
//! │                     reconciled                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use storehub_core::drawer::{apply_transaction, ensure_transition, validate_balance, variance};
use storehub_core::{
    CashDrawer, CashDrawerDetail, CoreError, DrawerStatus, DrawerStatusChange, DrawerTransaction,
    DrawerTransactionKind, Money, NewDrawerTransaction, OpenDrawer, Page, ValidationError,
};
use tracing::{debug, info};

use super::{begin_write, clean, new_id};
use crate::error::{DbError, DbResult};

const DRAWER_COLUMNS: &str = "id, register_name, employee_id, status, opening_balance_cents, \
     expected_balance_cents, counted_balance_cents, variance_cents, notes, opened_at, closed_at";

const TRANSACTION_COLUMNS: &str =
    "id, drawer_id, kind, amount_cents, balance_after, reason, sale_id, employee_id, created_at";

/// One cash movement, written by the drawer screen, sales and voids.
#[derive(Debug, Clone)]
pub(crate) struct CashMovement<'a> {
    pub drawer_id: &'a str,
    pub kind: DrawerTransactionKind,
    /// Unsigned; the kind decides the direction.
    pub amount_cents: i64,
    pub reason: Option<&'a str>,
    pub sale_id: Option<&'a str>,
    pub employee_id: Option<&'a str>,
}

/// Records a movement on an open drawer, on an open connection or
/// transaction.
///
/// The balance check from [`apply_transaction`] is repeated in the UPDATE's
/// WHERE clause, so a concurrent movement cannot push the drawer below zero.
pub(crate) async fn record_in(
    conn: &mut SqliteConnection,
    movement: &CashMovement<'_>,
) -> DbResult<DrawerTransaction> {
    let drawer = fetch_drawer(conn, movement.drawer_id).await?;
    if drawer.status != DrawerStatus::Open {
        return Err(CoreError::DrawerNotOpen {
            id: drawer.id,
            status: drawer.status.as_str().to_string(),
        }
        .into());
    }

    let (signed, _) = apply_transaction(
        Money::from_cents(drawer.expected_balance_cents),
        movement.kind,
        Money::from_cents(movement.amount_cents),
    )?;

    let balance_after: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE cash_drawers
        SET expected_balance_cents = expected_balance_cents + ?1
        WHERE id = ?2 AND status = 'open' AND expected_balance_cents + ?1 >= 0
        RETURNING expected_balance_cents
        "#,
    )
    .bind(signed.cents())
    .bind(movement.drawer_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(balance_after) = balance_after else {
        // Lost a race with another movement or a status change.
        let latest = fetch_drawer(conn, movement.drawer_id).await?;
        return Err(if latest.status != DrawerStatus::Open {
            CoreError::DrawerNotOpen {
                id: latest.id,
                status: latest.status.as_str().to_string(),
            }
        } else {
            CoreError::NegativeDrawerBalance {
                balance_cents: latest.expected_balance_cents + signed.cents(),
            }
        }
        .into());
    };

    let transaction = DrawerTransaction {
        id: new_id(),
        drawer_id: movement.drawer_id.to_string(),
        kind: movement.kind,
        amount_cents: signed.cents(),
        balance_after,
        reason: clean(movement.reason),
        sale_id: movement.sale_id.map(str::to_string),
        employee_id: movement.employee_id.map(str::to_string),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO drawer_transactions (
            id, drawer_id, kind, amount_cents, balance_after, reason,
            sale_id, employee_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.drawer_id)
    .bind(transaction.kind)
    .bind(transaction.amount_cents)
    .bind(transaction.balance_after)
    .bind(&transaction.reason)
    .bind(&transaction.sale_id)
    .bind(&transaction.employee_id)
    .bind(transaction.created_at)
    .execute(&mut *conn)
    .await?;

    debug!(
        drawer_id = %movement.drawer_id,
        amount = transaction.amount_cents,
        balance_after,
        "Drawer transaction recorded"
    );

    Ok(transaction)
}

pub(crate) async fn fetch_drawer(conn: &mut SqliteConnection, id: &str) -> DbResult<CashDrawer> {
    let sql = format!("SELECT {DRAWER_COLUMNS} FROM cash_drawers WHERE id = ?1");

    sqlx::query_as::<_, CashDrawer>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Cash drawer", id))
}

#[derive(Debug, Clone)]
pub struct CashDrawerRepository {
    pool: SqlitePool,
}

impl CashDrawerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashDrawerRepository { pool }
    }

    /// Opens a session on a register.
    ///
    /// ## Returns
    /// * `Err(CoreError::DrawerAlreadyOpen)` - the register has an open or
    ///   counting session
    pub async fn open(&self, input: &OpenDrawer, employee_id: &str) -> DbResult<CashDrawer> {
        validate_balance(Money::from_cents(input.opening_balance_cents))?;

        let register = input.register_name.trim().to_string();
        info!(register = %register, opening = input.opening_balance_cents, "Opening cash drawer");

        let mut tx = begin_write(&self.pool).await?;

        let active: Option<String> = sqlx::query_scalar(
            "SELECT id FROM cash_drawers WHERE register_name = ?1 AND status IN ('open', 'counting')",
        )
        .bind(&register)
        .fetch_optional(&mut *tx)
        .await?;
        if active.is_some() {
            return Err(CoreError::DrawerAlreadyOpen { register }.into());
        }

        let drawer = CashDrawer {
            id: new_id(),
            register_name: register.clone(),
            employee_id: employee_id.to_string(),
            status: DrawerStatus::Open,
            opening_balance_cents: input.opening_balance_cents,
            expected_balance_cents: input.opening_balance_cents,
            counted_balance_cents: None,
            variance_cents: None,
            notes: clean(input.notes.as_deref()),
            opened_at: Utc::now(),
            closed_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO cash_drawers (
                id, register_name, employee_id, status, opening_balance_cents,
                expected_balance_cents, notes, opened_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&drawer.id)
        .bind(&drawer.register_name)
        .bind(&drawer.employee_id)
        .bind(drawer.status)
        .bind(drawer.opening_balance_cents)
        .bind(drawer.expected_balance_cents)
        .bind(&drawer.notes)
        .bind(drawer.opened_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::Core(CoreError::DrawerAlreadyOpen {
                register: register.clone(),
            }),
            other => other,
        })?;

        tx.commit().await?;
        Ok(drawer)
    }

    /// Sessions newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<DrawerStatus>, page: Page) -> DbResult<Vec<CashDrawer>> {
        let sql = format!(
            r#"
            SELECT {DRAWER_COLUMNS}
            FROM cash_drawers
            WHERE ?1 IS NULL OR status = ?1
            ORDER BY opened_at DESC
            LIMIT ?2 OFFSET ?3
            "#
        );

        let drawers = sqlx::query_as::<_, CashDrawer>(&sql)
            .bind(status)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(drawers)
    }

    pub async fn get(&self, id: &str) -> DbResult<CashDrawer> {
        let mut conn = self.pool.acquire().await?;
        fetch_drawer(&mut conn, id).await
    }

    /// Session with its transactions in the order they happened.
    pub async fn get_detail(&self, id: &str) -> DbResult<CashDrawerDetail> {
        let mut conn = self.pool.acquire().await?;
        let drawer = fetch_drawer(&mut conn, id).await?;

        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM drawer_transactions WHERE drawer_id = ?1 ORDER BY created_at, rowid"
        );
        let transactions = sqlx::query_as::<_, DrawerTransaction>(&sql)
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(CashDrawerDetail {
            drawer,
            transactions,
        })
    }

    /// Records a manual cash in or cash out. Sales and refunds are written
    /// by the sale workflow.
    pub async fn record_transaction(
        &self,
        drawer_id: &str,
        input: &NewDrawerTransaction,
        employee_id: Option<&str>,
    ) -> DbResult<DrawerTransaction> {
        if !matches!(input.kind, DrawerTransactionKind::CashIn | DrawerTransactionKind::CashOut) {
            return Err(ValidationError::NotAllowed {
                field: "kind".to_string(),
                allowed: vec!["cash_in".to_string(), "cash_out".to_string()],
            }
            .into());
        }

        let mut tx = begin_write(&self.pool).await?;
        let transaction = record_in(
            &mut tx,
            &CashMovement {
                drawer_id,
                kind: input.kind,
                amount_cents: input.amount_cents,
                reason: input.reason.as_deref(),
                sale_id: None,
                employee_id,
            },
        )
        .await?;
        tx.commit().await?;

        Ok(transaction)
    }

    /// Moves a session along the lifecycle.
    ///
    /// Closing requires `counted_balance_cents` and stores the variance and
    /// close time. A recount (`counting → open`) clears neither, since close
    /// overwrites both.
    pub async fn change_status(&self, id: &str, change: &DrawerStatusChange) -> DbResult<CashDrawer> {
        let mut tx = begin_write(&self.pool).await?;
        let drawer = fetch_drawer(&mut tx, id).await?;
        ensure_transition(drawer.status, change.status)?;

        let (counted, variance_cents, closed_at) = if change.status == DrawerStatus::Closed {
            let counted = change
                .counted_balance_cents
                .ok_or_else(|| ValidationError::required("counted_balance_cents"))?;
            validate_balance(Money::from_cents(counted))?;
            let v = variance(
                Money::from_cents(drawer.expected_balance_cents),
                Money::from_cents(counted),
            );
            (Some(counted), Some(v.cents()), Some(Utc::now()))
        } else {
            (drawer.counted_balance_cents, drawer.variance_cents, drawer.closed_at)
        };

        let notes = clean(change.notes.as_deref()).or(drawer.notes.clone());

        let result = sqlx::query(
            r#"
            UPDATE cash_drawers SET
                status = ?2, counted_balance_cents = ?3, variance_cents = ?4,
                closed_at = ?5, notes = ?6
            WHERE id = ?1 AND status = ?7
            "#,
        )
        .bind(id)
        .bind(change.status)
        .bind(counted)
        .bind(variance_cents)
        .bind(closed_at)
        .bind(&notes)
        .bind(drawer.status)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::InvalidTransition {
                entity: "cash drawer".to_string(),
                from: drawer.status.as_str().to_string(),
                to: change.status.as_str().to_string(),
            }
            .into());
        }

        let updated = fetch_drawer(&mut tx, id).await?;
        tx.commit().await?;

        info!(
            id = %id,
            from = drawer.status.as_str(),
            to = change.status.as_str(),
            variance = ?updated.variance_cents,
            "Cash drawer status changed"
        );
        Ok(updated)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, employee};
    use storehub_core::Role;

    fn open_req(register: &str, cents: i64) -> OpenDrawer {
        OpenDrawer {
            register_name: register.to_string(),
            opening_balance_cents: cents,
            notes: None,
        }
    }

    fn movement(kind: DrawerTransactionKind, cents: i64) -> NewDrawerTransaction {
        NewDrawerTransaction {
            kind,
            amount_cents: cents,
            reason: Some("float".into()),
        }
    }

    fn status(status: DrawerStatus, counted: Option<i64>) -> DrawerStatusChange {
        DrawerStatusChange {
            status,
            counted_balance_cents: counted,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_one_session_per_register() {
        let db = db().await;
        let cashier = employee(&db, "c@store.test", Role::Cashier).await;
        let repo = db.cash_drawers();

        repo.open(&open_req("REG-1", 10_000), &cashier).await.unwrap();
        let err = repo.open(&open_req("REG-1", 5_000), &cashier).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::DrawerAlreadyOpen { .. })));

        // Another register is fine.
        repo.open(&open_req("REG-2", 0), &cashier).await.unwrap();
    }

    #[tokio::test]
    async fn test_transactions_move_expected_balance() {
        let db = db().await;
        let cashier = employee(&db, "c@store.test", Role::Cashier).await;
        let repo = db.cash_drawers();
        let drawer = repo.open(&open_req("REG-1", 10_000), &cashier).await.unwrap();

        let t = repo
            .record_transaction(&drawer.id, &movement(DrawerTransactionKind::CashOut, 2_500), Some(&cashier))
            .await
            .unwrap();
        assert_eq!(t.amount_cents, -2_500);
        assert_eq!(t.balance_after, 7_500);

        let err = repo
            .record_transaction(&drawer.id, &movement(DrawerTransactionKind::CashOut, 9_000), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::NegativeDrawerBalance { .. })));

        let err = repo
            .record_transaction(&drawer.id, &movement(DrawerTransactionKind::Sale, 100), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let detail = repo.get_detail(&drawer.id).await.unwrap();
        assert_eq!(detail.drawer.expected_balance_cents, 7_500);
        assert_eq!(detail.transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_close_records_variance() {
        let db = db().await;
        let cashier = employee(&db, "c@store.test", Role::Cashier).await;
        let repo = db.cash_drawers();
        let drawer = repo.open(&open_req("REG-1", 10_000), &cashier).await.unwrap();

        // open → closed skips counting.
        let err = repo
            .change_status(&drawer.id, &status(DrawerStatus::Closed, Some(10_000)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidTransition { .. })));

        repo.change_status(&drawer.id, &status(DrawerStatus::Counting, None)).await.unwrap();

        // Money cannot move while counting.
        let err = repo
            .record_transaction(&drawer.id, &movement(DrawerTransactionKind::CashIn, 100), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::DrawerNotOpen { .. })));

        let err = repo
            .change_status(&drawer.id, &status(DrawerStatus::Closed, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let closed = repo
            .change_status(&drawer.id, &status(DrawerStatus::Closed, Some(9_950)))
            .await
            .unwrap();
        assert_eq!(closed.variance_cents, Some(-50));
        assert!(closed.closed_at.is_some());

        let reconciled = repo
            .change_status(&drawer.id, &status(DrawerStatus::Reconciled, None))
            .await
            .unwrap();
        assert_eq!(reconciled.variance_cents, Some(-50));

        // The register is free again.
        repo.open(&open_req("REG-1", 0), &cashier).await.unwrap();
        assert_eq!(repo.list(Some(DrawerStatus::Reconciled), Page::default()).await.unwrap().len(), 1);
    }
}

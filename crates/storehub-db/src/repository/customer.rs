//! Customer repository. Every customer owns exactly one loyalty account,
//! created in the same transaction.

use chrono::Utc;
use sqlx::SqlitePool;
use storehub_core::{Customer, CustomerUpdate, LoyaltyTier, NewCustomer, Page};
use tracing::debug;

use super::{begin_write, clean, like_pattern, new_id};
use crate::error::{DbError, DbResult};

const CUSTOMER_COLUMNS: &str = "id, first_name, last_name, email, phone, notes, \
     marketing_opt_in, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Searches by name, email or phone. Active customers only unless asked.
    pub async fn search(
        &self,
        q: Option<&str>,
        include_inactive: bool,
        page: Page,
    ) -> DbResult<Vec<Customer>> {
        let q = clean(q).map(|q| like_pattern(&q));
        let sql = format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE (?1 IS NULL
                   OR lower(first_name || ' ' || last_name) LIKE ?1 ESCAPE '\'
                   OR lower(COALESCE(email, '')) LIKE ?1 ESCAPE '\'
                   OR lower(COALESCE(phone, '')) LIKE ?1 ESCAPE '\')
              AND (?2 = 1 OR is_active = 1)
            ORDER BY last_name, first_name
            LIMIT ?3 OFFSET ?4
            "#
        );

        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(q)
            .bind(include_inactive)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    pub async fn get(&self, id: &str) -> DbResult<Customer> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");

        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Creates the customer and a bronze loyalty account with zero points.
    pub async fn create(&self, input: &NewCustomer) -> DbResult<Customer> {
        let now = Utc::now();
        let customer = Customer {
            id: new_id(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: clean(input.email.as_deref()).map(|e| e.to_lowercase()),
            phone: clean(input.phone.as_deref()),
            notes: clean(input.notes.as_deref()),
            marketing_opt_in: input.marketing_opt_in,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, "Inserting customer");

        let mut tx = begin_write(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, first_name, last_name, email, phone, notes,
                marketing_opt_in, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.notes)
        .bind(customer.marketing_opt_in)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DbError::duplicate("email", customer.email.clone().unwrap_or_default())
            }
            other => other,
        })?;

        sqlx::query(
            r#"
            INSERT INTO loyalty_accounts (customer_id, points_balance, lifetime_points, tier, created_at, updated_at)
            VALUES (?1, 0, 0, ?2, ?3, ?3)
            "#,
        )
        .bind(&customer.id)
        .bind(LoyaltyTier::Bronze)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(customer)
    }

    pub async fn update(&self, id: &str, update: &CustomerUpdate) -> DbResult<Customer> {
        let mut customer = self.get(id).await?;
        update.apply_to(&mut customer);
        customer.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE customers SET
                first_name = ?2, last_name = ?3, email = ?4, phone = ?5,
                notes = ?6, marketing_opt_in = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.notes)
        .bind(customer.marketing_opt_in)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DbError::duplicate("email", customer.email.clone().unwrap_or_default())
            }
            other => other,
        })?;

        Ok(customer)
    }

    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE customers SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::db;

    fn jane() -> NewCustomer {
        NewCustomer {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: Some("Jane@Example.com".into()),
            phone: Some("555-0199".into()),
            notes: None,
            marketing_opt_in: true,
        }
    }

    #[tokio::test]
    async fn test_create_opens_loyalty_account() {
        let db = db().await;
        let c = db.customers().create(&jane()).await.unwrap();
        assert_eq!(c.email.as_deref(), Some("jane@example.com"));

        let account = db.loyalty().account(&c.id).await.unwrap();
        assert_eq!(account.points_balance, 0);
        assert_eq!(account.tier, LoyaltyTier::Bronze);
    }

    #[tokio::test]
    async fn test_duplicate_email_rolls_back() {
        let db = db().await;
        db.customers().create(&jane()).await.unwrap();
        let err = db.customers().create(&jane()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let all = db.customers().search(None, true, Page::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_search() {
        let db = db().await;
        db.customers().create(&jane()).await.unwrap();

        let repo = db.customers();
        assert_eq!(repo.search(Some("jane doe"), false, Page::default()).await.unwrap().len(), 1);
        assert_eq!(repo.search(Some("0199"), false, Page::default()).await.unwrap().len(), 1);
        assert_eq!(repo.search(Some("EXAMPLE.COM"), false, Page::default()).await.unwrap().len(), 1);
        assert!(repo.search(Some("smith"), false, Page::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_search() {
        let db = db().await;
        let c = db.customers().create(&jane()).await.unwrap();
        db.customers().soft_delete(&c.id).await.unwrap();

        assert!(db.customers().search(None, false, Page::default()).await.unwrap().is_empty());
        assert!(!db.customers().get(&c.id).await.unwrap().is_active);
    }
}

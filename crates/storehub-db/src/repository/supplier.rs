//! Supplier repository.

use chrono::Utc;
use sqlx::SqlitePool;
use storehub_core::{NewSupplier, Page, Supplier, SupplierUpdate};
use tracing::debug;

use super::{clean, like_pattern, new_id};
use crate::error::{DbError, DbResult};

const SUPPLIER_COLUMNS: &str =
    "id, name, contact_name, email, phone, address, notes, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists suppliers by name. `q` matches name, contact or email.
    pub async fn list(
        &self,
        q: Option<&str>,
        include_inactive: bool,
        page: Page,
    ) -> DbResult<Vec<Supplier>> {
        let q = clean(q).map(|q| like_pattern(&q));
        let sql = format!(
            r#"
            SELECT {SUPPLIER_COLUMNS}
            FROM suppliers
            WHERE (?1 IS NULL
                   OR lower(name) LIKE ?1 ESCAPE '\'
                   OR lower(COALESCE(contact_name, '')) LIKE ?1 ESCAPE '\'
                   OR lower(COALESCE(email, '')) LIKE ?1 ESCAPE '\')
              AND (?2 = 1 OR is_active = 1)
            ORDER BY name
            LIMIT ?3 OFFSET ?4
            "#
        );

        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .bind(q)
            .bind(include_inactive)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    pub async fn get(&self, id: &str) -> DbResult<Supplier> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?1");

        sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    pub async fn create(&self, input: &NewSupplier) -> DbResult<Supplier> {
        debug!(name = %input.name, "Inserting supplier");

        let now = Utc::now();
        let supplier = Supplier {
            id: new_id(),
            name: input.name.trim().to_string(),
            contact_name: clean(input.contact_name.as_deref()),
            email: clean(input.email.as_deref()).map(|e| e.to_lowercase()),
            phone: clean(input.phone.as_deref()),
            address: clean(input.address.as_deref()),
            notes: clean(input.notes.as_deref()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, name, contact_name, email, phone, address, notes,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact_name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.notes)
        .bind(supplier.is_active)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    pub async fn update(&self, id: &str, update: &SupplierUpdate) -> DbResult<Supplier> {
        let mut supplier = self.get(id).await?;
        update.apply_to(&mut supplier);
        supplier.email = supplier.email.map(|e| e.to_lowercase());
        supplier.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE suppliers SET
                name = ?2, contact_name = ?3, email = ?4, phone = ?5,
                address = ?6, notes = ?7, is_active = ?8, updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact_name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.notes)
        .bind(supplier.is_active)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Suppliers are only ever deactivated; purchase orders keep pointing at them.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE suppliers SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::db;

    fn acme() -> NewSupplier {
        NewSupplier {
            name: "Acme Wholesale".into(),
            contact_name: Some("Rita".into()),
            email: Some("Orders@Acme.test".into()),
            phone: None,
            address: None,
            notes: Some("  ".into()),
        }
    }

    #[tokio::test]
    async fn test_create_and_search() {
        let db = db().await;
        let created = db.suppliers().create(&acme()).await.unwrap();
        assert_eq!(created.email.as_deref(), Some("orders@acme.test"));
        assert_eq!(created.notes, None);

        let found = db.suppliers().list(Some("rita"), false, Page::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        let none = db.suppliers().list(Some("zzz"), false, Page::default()).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_deactivate() {
        let db = db().await;
        let s = db.suppliers().create(&acme()).await.unwrap();

        let updated = db
            .suppliers()
            .update(
                &s.id,
                &SupplierUpdate {
                    phone: Some("555-0100".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
        assert_eq!(updated.name, "Acme Wholesale");

        db.suppliers().deactivate(&s.id).await.unwrap();
        assert!(db.suppliers().list(None, false, Page::default()).await.unwrap().is_empty());
        assert_eq!(db.suppliers().list(None, true, Page::default()).await.unwrap().len(), 1);
    }
}

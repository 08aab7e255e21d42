//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Filtered listing (`q` over sku/name/barcode, category, active flag)
//! - Exact barcode-or-SKU lookup for the scanner
//! - CRUD with soft delete
//!
//! ## Creating a Product
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(NewProduct)                         one transaction             │
//! │       │                                                                 │
//! │       ├── INSERT products                                              │
//! │       ├── INSERT inventory_levels (initial_quantity, reorder_level)    │
//! │       └── INSERT inventory_adjustments  (only if initial_quantity > 0) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use storehub_core::{AdjustmentReason, NewProduct, Page, Product, ProductUpdate};
use tracing::debug;

use super::inventory::{apply_change_in, StockChange};
use super::{begin_write, clean, like_pattern, new_id};
use crate::error::{DbError, DbResult};

pub(crate) const PRODUCT_COLUMNS: &str = "id, sku, barcode, name, description, category, price_cents, \
     cost_cents, tax_rate_bps, track_inventory, allow_negative_stock, is_active, \
     created_at, updated_at";

/// List filters for `GET /api/products`.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of sku, name or barcode.
    pub q: Option<String>,
    pub category: Option<String>,
    pub include_inactive: bool,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products matching `filter`, ordered by name.
    pub async fn list(&self, filter: &ProductFilter, page: Page) -> DbResult<Vec<Product>> {
        debug!(q = ?filter.q, category = ?filter.category, "Listing products");

        let q = clean(filter.q.as_deref()).map(|q| like_pattern(&q));
        let category = clean(filter.category.as_deref());

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE (?1 IS NULL
                   OR lower(sku) LIKE ?1 ESCAPE '\'
                   OR lower(name) LIKE ?1 ESCAPE '\'
                   OR lower(COALESCE(barcode, '')) LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR category = ?2 COLLATE NOCASE)
              AND (?3 = 1 OR is_active = 1)
            ORDER BY name, sku
            LIMIT ?4 OFFSET ?5
            "#
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(q)
            .bind(category)
            .bind(filter.include_inactive)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Product list returned");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such product (inactive ones are returned)
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Exact lookup by barcode, falling back to SKU. Active products only.
    pub async fn lookup(&self, code: &str) -> DbResult<Option<Product>> {
        let code = code.trim();
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE (barcode = ?1 OR sku = ?1) AND is_active = 1
            ORDER BY CASE WHEN barcode = ?1 THEN 0 ELSE 1 END
            LIMIT 1
            "#
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product together with its inventory level.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU or barcode already exists
    pub async fn create(&self, input: &NewProduct, employee_id: Option<&str>) -> DbResult<Product> {
        debug!(sku = %input.sku, "Inserting product");

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            sku: input.sku.trim().to_string(),
            barcode: clean(input.barcode.as_deref()),
            name: input.name.trim().to_string(),
            description: clean(input.description.as_deref()),
            category: clean(input.category.as_deref()),
            price_cents: input.price_cents,
            cost_cents: input.cost_cents,
            tax_rate_bps: input.tax_rate_bps,
            track_inventory: input.track_inventory,
            allow_negative_stock: input.allow_negative_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let mut tx = begin_write(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, barcode, name, description, category,
                price_cents, cost_cents, tax_rate_bps,
                track_inventory, allow_negative_stock, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.tax_rate_bps)
        .bind(product.track_inventory)
        .bind(product.allow_negative_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field.ends_with("barcode") => {
                DbError::duplicate("barcode", product.barcode.clone().unwrap_or_default())
            }
            DbError::UniqueViolation { .. } => DbError::duplicate("sku", &product.sku),
            other => other,
        })?;

        sqlx::query(
            r#"
            INSERT INTO inventory_levels (product_id, quantity, reorder_level, location, updated_at)
            VALUES (?1, 0, ?2, ?3, ?4)
            "#,
        )
        .bind(&product.id)
        .bind(input.reorder_level)
        .bind(clean(input.location.as_deref()))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if input.initial_quantity != 0 {
            apply_change_in(
                &mut *tx,
                &StockChange {
                    product_id: &product.id,
                    quantity_change: input.initial_quantity,
                    reason: AdjustmentReason::Received,
                    reference_id: None,
                    notes: Some("opening stock"),
                    employee_id,
                },
            )
            .await?;
        }

        tx.commit().await?;

        Ok(product)
    }

    /// Applies a partial update and returns the stored product.
    pub async fn update(&self, id: &str, update: &ProductUpdate) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let mut product = self.get(id).await?;
        update.apply_to(&mut product);
        product.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                barcode = ?3,
                name = ?4,
                description = ?5,
                category = ?6,
                price_cents = ?7,
                cost_cents = ?8,
                tax_rate_bps = ?9,
                track_inventory = ?10,
                allow_negative_stock = ?11,
                is_active = ?12,
                updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.tax_rate_bps)
        .bind(product.track_inventory)
        .bind(product.allow_negative_stock)
        .bind(product.is_active)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(product)
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sales and adjustments still reference the row.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, new_product, product};

    #[tokio::test]
    async fn test_create_seeds_inventory() {
        let db = db().await;
        let p = product(&db, "COKE-330", 199, 12).await;

        let level = db.inventory().get(&p.id).await.unwrap();
        assert_eq!(level.quantity, 12);
        assert_eq!(level.reorder_level, 2);

        let adjustments = db.inventory().adjustments(&p.id, Page::default()).await.unwrap();
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].reason, AdjustmentReason::Received);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = db().await;
        product(&db, "DUP-1", 100, 0).await;

        let err = db
            .products()
            .create(&new_product("DUP-1", 100, 0), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "sku"));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = db().await;
        product(&db, "COKE-330", 199, 1).await;
        product(&db, "PEPSI-330", 189, 1).await;
        let gone = product(&db, "COKE-500", 249, 1).await;
        db.products().soft_delete(&gone.id).await.unwrap();

        let repo = db.products();
        let filter = ProductFilter {
            q: Some("coke".into()),
            ..Default::default()
        };
        assert_eq!(repo.list(&filter, Page::default()).await.unwrap().len(), 1);

        let filter = ProductFilter {
            q: Some("coke".into()),
            include_inactive: true,
            ..Default::default()
        };
        assert_eq!(repo.list(&filter, Page::default()).await.unwrap().len(), 2);

        let filter = ProductFilter {
            category: Some("test".into()),
            ..Default::default()
        };
        assert_eq!(repo.list(&filter, Page::default()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_lookup_by_barcode_or_sku() {
        let db = db().await;
        let mut input = new_product("WATER-1L", 99, 0);
        input.barcode = Some("5449000000996".into());
        let created = db.products().create(&input, None).await.unwrap();

        let by_barcode = db.products().lookup("5449000000996").await.unwrap().unwrap();
        assert_eq!(by_barcode.id, created.id);

        let by_sku = db.products().lookup("WATER-1L").await.unwrap().unwrap();
        assert_eq!(by_sku.id, created.id);

        assert!(db.products().lookup("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_soft_delete() {
        let db = db().await;
        let p = product(&db, "CHIPS", 150, 0).await;

        let updated = db
            .products()
            .update(
                &p.id,
                &ProductUpdate {
                    price_cents: Some(175),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_cents, 175);
        assert_eq!(db.products().get(&p.id).await.unwrap().price_cents, 175);

        db.products().soft_delete(&p.id).await.unwrap();
        assert!(!db.products().get(&p.id).await.unwrap().is_active);
        assert_eq!(db.products().count().await.unwrap(), 0);

        let missing = db.products().get("missing").await.unwrap_err();
        assert!(matches!(missing, DbError::NotFound { .. }));
    }
}

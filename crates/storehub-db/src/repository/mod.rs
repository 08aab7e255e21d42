//! # Repository Module
//!
//! Database repository implementations for StoreHub.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Route handler                                                         │
//! │       │                                                                 │
//! │       │  state.db.inventory().adjust(&req, Some(&employee_id))         │
//! │       ▼                                                                 │
//! │  InventoryRepository                                                   │
//! │  ├── list / get / update_settings                                      │
//! │  ├── adjust            ─┐                                              │
//! │  └── adjustments        │ one transaction:                             │
//! │                         │   guarded UPDATE ... RETURNING quantity      │
//! │                         │   INSERT inventory_adjustments               │
//! │       │                 ┘                                              │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transactions
//! Multi-statement writes open a transaction and pass `&mut *tx` to every
//! query, including the `*_in` helpers that other repositories share
//! (stock changes, ledger rows, drawer movements). Nothing inside a
//! transaction reaches back to the pool.
//!
//! Write transactions start with `BEGIN IMMEDIATE` ([`begin_write`]) so the
//! write lock is taken before the first read. A deferred transaction that
//! reads first cannot wait for the lock when it later writes; SQLite fails
//! it with `SQLITE_BUSY` instead.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Catalog CRUD, search and lookup
//! - [`InventoryRepository`] - Stock levels and the adjustment audit trail
//! - [`SupplierRepository`] - Vendors
//! - [`PurchaseOrderRepository`] - Purchasing and receiving
//! - [`EmployeeRepository`] - Staff accounts and credentials
//! - [`CustomerRepository`] - Customers (with their loyalty account)
//! - [`LoyaltyRepository`] - Points ledger and rewards catalog
//! - [`SaleRepository`] - Checkout and voids
//! - [`CashDrawerRepository`] - Drawer sessions and cash movements
//! - [`EmailRepository`] - Templates and delivery log
//! - [`ReportRepository`] - Read models for compliance reports

pub mod cash_drawer;
pub mod customer;
pub mod email;
pub mod employee;
pub mod inventory;
pub mod loyalty;
pub mod product;
pub mod purchase_order;
pub mod report;
pub mod sale;
pub mod supplier;

pub use cash_drawer::CashDrawerRepository;
pub use customer::CustomerRepository;
pub use email::{EmailRepository, NewEmailLog};
pub use employee::EmployeeRepository;
pub use inventory::{AdjustmentOutcome, InventoryRepository};
pub use loyalty::{LedgerOutcome, LoyaltyRepository};
pub use product::{ProductFilter, ProductRepository};
pub use purchase_order::PurchaseOrderRepository;
pub use report::ReportRepository;
pub use sale::{SaleFilter, SaleRepository};
pub use supplier::SupplierRepository;

use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::error::DbResult;

/// Generates a new entity ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Opens a transaction holding the database write lock.
///
/// Waits up to the pool's busy timeout for other writers.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Trims optional text; blank becomes `None`.
pub(crate) fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `%term%` for case-insensitive LIKE searches. `%` and `_` in user input
/// are escaped with `\`.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped.to_lowercase())
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use chrono::Utc;
    use storehub_core::{Customer, NewCustomer, NewProduct, Product, Role};

    use crate::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// A database file in the temp dir, removed on drop.
    ///
    /// In-memory databases have a single connection, so only a file shows
    /// how concurrent writers interact.
    pub struct FileDb {
        pub db: Database,
        path: PathBuf,
    }

    impl Drop for FileDb {
        fn drop(&mut self) {
            for suffix in ["", "-wal", "-shm"] {
                let _ = std::fs::remove_file(format!("{}{}", self.path.display(), suffix));
            }
        }
    }

    pub async fn file_db() -> FileDb {
        let path = std::env::temp_dir().join(format!("storehub-test-{}.db", super::new_id()));
        let db = Database::new(DbConfig::new(path.clone()).max_connections(8))
            .await
            .unwrap();
        FileDb { db, path }
    }

    /// Inserts an employee directly and returns its id.
    pub async fn employee(db: &Database, email: &str, role: Role) -> String {
        let id = super::new_id();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO employees (id, email, full_name, role, password_hash, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'hash', 1, ?5, ?5)",
        )
        .bind(&id)
        .bind(email)
        .bind("Test Employee")
        .bind(role)
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
        id
    }

    pub fn new_product(sku: &str, price_cents: i64, initial_quantity: i64) -> NewProduct {
        NewProduct {
            sku: sku.to_string(),
            barcode: None,
            name: format!("Product {}", sku),
            description: None,
            category: Some("Test".to_string()),
            price_cents,
            cost_cents: Some(price_cents / 2),
            tax_rate_bps: 825,
            track_inventory: true,
            allow_negative_stock: false,
            initial_quantity,
            reorder_level: 2,
            location: None,
        }
    }

    pub async fn product(db: &Database, sku: &str, price_cents: i64, qty: i64) -> Product {
        db.products()
            .create(&new_product(sku, price_cents, qty), None)
            .await
            .unwrap()
    }

    pub async fn customer(db: &Database, first_name: &str) -> Customer {
        db.customers()
            .create(&NewCustomer {
                first_name: first_name.to_string(),
                last_name: "Tester".to_string(),
                email: None,
                phone: None,
                notes: None,
                marketing_opt_in: false,
            })
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean() {
        assert_eq!(clean(Some("  hi ")), Some("hi".to_string()));
        assert_eq!(clean(Some("   ")), None);
        assert_eq!(clean(None), None);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Coke"), "%coke%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}

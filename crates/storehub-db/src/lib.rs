//! # storehub-db: Database Layer for StoreHub
//!
//! This crate provides database access for the StoreHub back office.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StoreHub Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   storehub-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (sale.rs ...) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ SaleRepo      │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │◄───│ InventoryRepo │    │ 002_...sql   │  │   │
//! │  │   │ Management    │    │ LoyaltyRepo   │    │ 003_email.sql│  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  │   ./storehub.db                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations, one per aggregate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storehub_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./storehub.db")).await?;
//!
//! let level = db.inventory().get(&product_id).await?;
//! let sale = db.sales().create(&new_sale, &employee_id, 100).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    AdjustmentOutcome, CashDrawerRepository, CustomerRepository, EmailRepository,
    EmployeeRepository, InventoryRepository, LedgerOutcome, LoyaltyRepository, NewEmailLog,
    ProductFilter, ProductRepository, PurchaseOrderRepository, ReportRepository, SaleFilter,
    SaleRepository, SupplierRepository,
};

//! # storehub-core: Pure Business Logic for StoreHub
//!
//! This crate holds the store's business rules as pure functions with zero
//! I/O dependencies. The database layer and the HTTP API both call into it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StoreHub Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 storehub-api (axum HTTP server)                 │   │
//! │  │    auth ──► routes ──► email service ──► JSON responses         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ storehub-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ SaleTotals│  │   rules   │  │   │
//! │  │   │   Sale    │  │  TaxRate  │  │  numbers  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  loyalty  │  │  drawer   │  │ template  │  │ reporting │  │   │
//! │  │   │   tiers   │  │ balances  │  │ {{ var }} │  │ aggregates│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 storehub-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, CashDrawer, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level input validation
//! - [`pricing`] - Sale line totals, tax and document numbers
//! - [`loyalty`] - Tier thresholds and point earning
//! - [`drawer`] - Cash drawer balance and status rules
//! - [`template`] - `{{ variable }}` email template rendering
//! - [`reporting`] - Aggregations behind the compliance reports
//!
//! ## Example Usage
//!
//! ```rust
//! use storehub_core::money::Money;
//! use storehub_core::types::TaxRate;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let tax = price.calculate_tax(TaxRate::from_bps(825)); // 8.25%
//!
//! // Tax on $10.99 at 8.25% = $0.91 (rounded)
//! assert_eq!(tax.cents(), 91);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod drawer;
pub mod error;
pub mod loyalty;
pub mod money;
pub mod pricing;
pub mod reporting;
pub mod template;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Constants
// =============================================================================

/// Default number of rows returned by list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Upper bound for the `limit` query parameter.
pub const MAX_PAGE_SIZE: i64 = 200;

/// Maximum number of lines on a single sale.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single sale line.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest single money amount accepted from a request ($100,000,000.00).
///
/// Keeps `amount × quantity` sums for a full sale or purchase order well
/// inside `i64`.
pub const MAX_MONEY_CENTS: i64 = 10_000_000_000;

/// Largest stock quantity or stock change accepted from a request.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000;

/// Largest points amount accepted from a request.
pub const MAX_POINTS: i64 = 100_000_000;

/// Days covered by a report when no `from` is given.
pub const DEFAULT_REPORT_DAYS: i64 = 30;

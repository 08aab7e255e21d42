//! # Error Types
//!
//! Domain-specific error types for storehub-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storehub-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  storehub-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - What the client sees (status + JSON body)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. The API layer maps all
/// of them (except `Validation`) to HTTP 422.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough stock to complete a sale or a negative adjustment.
    ///
    /// ## When This Occurs
    /// - Selling more than is on hand for a product that tracks inventory
    /// - An adjustment that would take the level below zero
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Loyalty account cannot cover a redemption.
    #[error("Insufficient points: balance {balance}, requested {requested}")]
    InsufficientPoints { balance: i64, requested: i64 },

    /// A status change outside the allowed transitions.
    ///
    /// ## When This Occurs
    /// - Reconciling a drawer that is still open
    /// - Receiving against a cancelled purchase order
    /// - Voiding an already voided sale
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: String,
        from: String,
        to: String,
    },

    /// The referenced record exists but is deactivated.
    #[error("{entity} {id} is inactive")]
    Inactive { entity: String, id: String },

    /// A cash drawer operation would leave the drawer below zero.
    #[error("Drawer balance cannot go negative (would be {balance_cents} cents)")]
    NegativeDrawerBalance { balance_cents: i64 },

    /// Payment does not cover the sale.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Sale has more lines than allowed.
    #[error("A sale cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// Receiving more than is outstanding on a purchase order line.
    #[error("Cannot receive {requested} for item {item_id}: only {outstanding} outstanding")]
    OverReceipt {
        item_id: String,
        outstanding: i64,
        requested: i64,
    },

    /// An operation that is not allowed on the caller's own record.
    #[error("{0}")]
    SelfAction(String),

    /// A register already has a drawer session in progress.
    #[error("Register {register} already has an open drawer session")]
    DrawerAlreadyOpen { register: String },

    /// Money can only move through a drawer while it is open.
    #[error("Cash drawer {id} is {status}, not open")]
    DrawerNotOpen { id: String, status: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be zero.
    #[error("{field} must not be zero")]
    MustBeNonZero { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

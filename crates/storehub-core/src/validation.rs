//! # Validation Module
//!
//! Input validation utilities for StoreHub.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Route handler (Rust)                                         │
//! │  ├── Type validation (serde deserialization → 422/400)                 │
//! │  └── THIS MODULE: field rules before any query runs                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Business rules (drawer, loyalty, pricing modules)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (sku, email, template name)                    │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storehub_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("COKE-330").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_MONEY_CENTS, MAX_POINTS, MAX_SALE_LINES, MAX_STOCK_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ```rust
/// use storehub_core::validation::validate_sku;
///
/// assert!(validate_sku("COKE-330").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid_format(
            "sku",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Validates a required display string (product name, supplier name, ...).
pub fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a search query. Empty is allowed (list everything).
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates an e-mail address.
///
/// Deliberately loose: one `@`, a non-empty local part, a dotted domain and
/// no whitespace. The provider does the real verification.
///
/// ```rust
/// use storehub_core::validation::validate_email;
///
/// assert!(validate_email("jo@example.com").is_ok());
/// assert!(validate_email("jo@localhost").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let invalid = || ValidationError::invalid_format("email", "must be a valid email address");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a new password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }

    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

/// Validates a template slug: lowercase letters, digits and underscores.
pub fn validate_template_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, 100)?;

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ValidationError::invalid_format(
            "name",
            "must contain only lowercase letters, digits, and underscores",
        ));
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a strictly positive count (PO quantities, points, reward cost).
pub fn validate_positive(field: &str, value: i64) -> ValidationResult<()> {
    if value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a non-negative amount or count.
///
/// ```rust
/// use storehub_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("price", 0).is_ok());
/// assert!(validate_non_negative("price", -100).is_err());
/// ```
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates that `value` lies in `min..=max`.
pub fn validate_range(field: &str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

/// Validates a money amount from a request: `0..=MAX_MONEY_CENTS`.
///
/// ```rust
/// use storehub_core::validation::validate_amount;
///
/// assert!(validate_amount("price_cents", 199).is_ok());
/// assert!(validate_amount("price_cents", -1).is_err());
/// assert!(validate_amount("price_cents", i64::MAX).is_err());
/// ```
pub fn validate_amount(field: &str, cents: i64) -> ValidationResult<()> {
    validate_range(field, cents, 0, MAX_MONEY_CENTS)
}

/// Validates a stock level or count: `0..=MAX_STOCK_QUANTITY`.
pub fn validate_stock_quantity(field: &str, value: i64) -> ValidationResult<()> {
    validate_range(field, value, 0, MAX_STOCK_QUANTITY)
}

/// Validates a signed stock change: non-zero, at most `MAX_STOCK_QUANTITY`
/// either way.
pub fn validate_stock_change(field: &str, change: i64) -> ValidationResult<()> {
    if change == 0 {
        return Err(ValidationError::MustBeNonZero {
            field: field.to_string(),
        });
    }
    validate_range(field, change, -MAX_STOCK_QUANTITY, MAX_STOCK_QUANTITY)
}

/// Validates a points amount: at most `MAX_POINTS` either way.
pub fn validate_points(field: &str, points: i64) -> ValidationResult<()> {
    validate_range(field, points, -MAX_POINTS, MAX_POINTS)
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate_bps".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines on a sale.
pub fn validate_sale_lines(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::required("items"));
    }

    if count > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ```rust
/// use storehub_core::validation::validate_uuid;
///
/// assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    uuid::Uuid::parse_str(id)
        .map_err(|_| ValidationError::invalid_format(field, "must be a valid UUID"))?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COKE-330").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Coca-Cola 330ml", 200).is_ok());
        assert!(validate_name("name", "  ", 200).is_err());
        assert!(validate_name("name", &"A".repeat(300), 200).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("jo@example.com").is_ok());
        assert!(validate_email("jo.smith+pos@shop.co.uk").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("jo").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("jo@example").is_err());
        assert!(validate_email("jo@@example.com").is_err());
        assert!(validate_email("jo @example.com").is_err());
        assert!(validate_email("jo@example..com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_template_name() {
        assert!(validate_template_name("low_stock_alert").is_ok());
        assert!(validate_template_name("Low Stock").is_err());
        assert!(validate_template_name("").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_sale_lines() {
        assert!(validate_sale_lines(1).is_ok());
        assert!(validate_sale_lines(0).is_err());
        assert!(validate_sale_lines(MAX_SALE_LINES + 1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "123").is_err());
    }

    #[test]
    fn test_numeric_upper_bounds() {
        assert!(validate_amount("price_cents", MAX_MONEY_CENTS).is_ok());
        assert!(validate_amount("price_cents", MAX_MONEY_CENTS + 1).is_err());
        assert!(validate_amount("price_cents", i64::MIN).is_err());

        assert!(validate_stock_quantity("reorder_level", 0).is_ok());
        assert!(validate_stock_quantity("reorder_level", i64::MAX).is_err());

        assert!(validate_stock_change("quantity_change", -MAX_STOCK_QUANTITY).is_ok());
        assert!(matches!(
            validate_stock_change("quantity_change", 0),
            Err(ValidationError::MustBeNonZero { .. })
        ));
        assert!(matches!(
            validate_stock_change("quantity_change", i64::MIN),
            Err(ValidationError::OutOfRange { .. })
        ));

        assert!(validate_points("points", -MAX_POINTS).is_ok());
        assert!(validate_points("points", i64::MIN).is_err());
        assert!(validate_points("points", i64::MAX).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(825).is_ok());
        assert!(validate_tax_rate_bps(10000).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }
}

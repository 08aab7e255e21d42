//! # Cash Drawer Rules
//!
//! Pure checks used by the cash drawer endpoints and the sale flow.
//!
//! ## Session Lifecycle
//! ```text
//! ┌──────┐  count   ┌──────────┐  close   ┌────────┐ reconcile ┌────────────┐
//! │ open │ ───────► │ counting │ ───────► │ closed │ ────────► │ reconciled │
//! └──────┘ ◄─────── └──────────┘          └────────┘           └────────────┘
//!           recount
//! ```
//!
//! Money moves only while a drawer is `open`. Closing stores the counted
//! balance and its variance from the expected balance.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{DrawerStatus, DrawerTransactionKind};
use crate::validation::validate_amount;
use crate::MAX_MONEY_CENTS;

/// A drawer balance must never go below zero.
pub fn validate_balance(balance: Money) -> CoreResult<()> {
    if balance.is_negative() {
        return Err(CoreError::NegativeDrawerBalance {
            balance_cents: balance.cents(),
        });
    }
    Ok(())
}

/// A drawer transaction must move some money.
pub fn validate_transaction_amount(amount: Money) -> CoreResult<()> {
    if amount.is_zero() {
        return Err(ValidationError::MustBeNonZero {
            field: "amount_cents".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Whitelisted status changes.
pub fn can_transition(from: DrawerStatus, to: DrawerStatus) -> bool {
    use DrawerStatus::*;
    matches!(
        (from, to),
        (Open, Counting) | (Counting, Open) | (Counting, Closed) | (Closed, Reconciled)
    )
}

/// Like [`can_transition`] but returns the error the API reports.
pub fn ensure_transition(from: DrawerStatus, to: DrawerStatus) -> CoreResult<()> {
    if !can_transition(from, to) {
        return Err(CoreError::InvalidTransition {
            entity: "cash drawer".to_string(),
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        });
    }
    Ok(())
}

/// Applies a transaction of unsigned `amount` and returns
/// `(signed_amount, balance_after)`.
///
/// ## Errors
/// - amount is zero or negative
/// - the resulting balance would be negative
///
/// ```rust
/// use storehub_core::drawer::apply_transaction;
/// use storehub_core::money::Money;
/// use storehub_core::types::DrawerTransactionKind;
///
/// let (signed, after) = apply_transaction(
///     Money::from_cents(10_000),
///     DrawerTransactionKind::CashOut,
///     Money::from_cents(2_500),
/// ).unwrap();
/// assert_eq!(signed.cents(), -2_500);
/// assert_eq!(after.cents(), 7_500);
/// ```
pub fn apply_transaction(
    balance: Money,
    kind: DrawerTransactionKind,
    amount: Money,
) -> CoreResult<(Money, Money)> {
    validate_transaction_amount(amount)?;
    if amount.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: "amount_cents".to_string(),
        }
        .into());
    }
    validate_amount("amount_cents", amount.cents())?;

    let signed = Money::from_cents(amount.cents() * kind.sign());
    let after = balance
        .cents()
        .checked_add(signed.cents())
        .map(Money::from_cents)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "amount_cents".to_string(),
            min: 1,
            max: MAX_MONEY_CENTS,
        })?;
    validate_balance(after)?;

    Ok((signed, after))
}

/// Counted minus expected. Positive means the drawer is over.
pub fn variance(expected: Money, counted: Money) -> Money {
    counted - expected
}

/// Formats an amount for drawer slips and reports.
pub fn format_currency(amount: Money) -> String {
    amount.format()
}

#[cfg(test)]
mod tests {
    use super::*;
    use DrawerStatus::*;

    #[test]
    fn test_balance_non_negative() {
        assert!(validate_balance(Money::zero()).is_ok());
        assert!(validate_balance(Money::from_cents(1)).is_ok());
        assert!(matches!(
            validate_balance(Money::from_cents(-1)),
            Err(CoreError::NegativeDrawerBalance { balance_cents: -1 })
        ));
    }

    #[test]
    fn test_transaction_amount_non_zero() {
        assert!(validate_transaction_amount(Money::from_cents(500)).is_ok());
        assert!(validate_transaction_amount(Money::from_cents(-500)).is_ok());
        assert!(validate_transaction_amount(Money::zero()).is_err());
    }

    #[test]
    fn test_transition_whitelist() {
        assert!(can_transition(Open, Counting));
        assert!(can_transition(Counting, Open));
        assert!(can_transition(Counting, Closed));
        assert!(can_transition(Closed, Reconciled));

        assert!(!can_transition(Open, Closed));
        assert!(!can_transition(Open, Reconciled));
        assert!(!can_transition(Closed, Open));
        assert!(!can_transition(Reconciled, Open));
        assert!(!can_transition(Open, Open));
        assert!(ensure_transition(Reconciled, Closed).is_err());
    }

    #[test]
    fn test_apply_transaction() {
        let (signed, after) = apply_transaction(
            Money::from_cents(5_000),
            DrawerTransactionKind::CashIn,
            Money::from_cents(1_000),
        )
        .unwrap();
        assert_eq!(signed.cents(), 1_000);
        assert_eq!(after.cents(), 6_000);

        let overdraw = apply_transaction(
            Money::from_cents(5_000),
            DrawerTransactionKind::Refund,
            Money::from_cents(5_001),
        );
        assert!(matches!(overdraw, Err(CoreError::NegativeDrawerBalance { .. })));

        let negative = apply_transaction(
            Money::from_cents(5_000),
            DrawerTransactionKind::CashIn,
            Money::from_cents(-100),
        );
        assert!(matches!(negative, Err(CoreError::Validation(_))));

        let huge = apply_transaction(
            Money::from_cents(i64::MAX - 10),
            DrawerTransactionKind::CashIn,
            Money::from_cents(i64::MAX),
        );
        assert!(matches!(huge, Err(CoreError::Validation(_))));

        let overflow = apply_transaction(
            Money::from_cents(i64::MAX - 10),
            DrawerTransactionKind::CashIn,
            Money::from_cents(100),
        );
        assert!(matches!(overflow, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_variance() {
        assert_eq!(variance(Money::from_cents(10_000), Money::from_cents(9_950)).cents(), -50);
        assert_eq!(variance(Money::from_cents(10_000), Money::from_cents(10_000)).cents(), 0);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Money::from_cents(123_456)), "$1,234.56");
        assert_eq!(format_currency(Money::from_cents(-550)), "-$5.50");
        assert_eq!(format_currency(Money::zero()), "$0.00");
        assert_eq!(format_currency(Money::from_cents(100_000_000)), "$1,000,000.00");
    }
}

//! # Pricing
//!
//! Sale line math and human-readable document numbers.
//!
//! ## Tax Per Line
//! ```text
//! line_total = unit_price × quantity
//! line_tax   = round_half_away(line_total × bps / 10000)
//! subtotal   = Σ line_total
//! tax        = Σ line_tax
//! total      = subtotal + tax
//! ```
//! Tax is rounded per line so a receipt's printed lines always add up to
//! its printed total.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, TaxRate};

/// Computed amounts for one sale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    pub line_total: Money,
    pub tax: Money,
}

/// Computes the pre-tax total and tax for a line.
pub fn line_amounts(unit_price: Money, tax_rate: TaxRate, quantity: i64) -> LineAmounts {
    let line_total = unit_price.multiply_quantity(quantity);
    LineAmounts {
        line_total,
        tax: line_total.calculate_tax(tax_rate),
    }
}

/// Sale-level totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl SaleTotals {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a LineAmounts>) -> Self {
        let mut totals = SaleTotals::default();
        for line in lines {
            totals.subtotal += line.line_total;
            totals.tax += line.tax;
        }
        totals.total = totals.subtotal + totals.tax;
        totals
    }
}

/// Validates the tendered amount and returns the change due.
///
/// Cash must cover the total. Card and other payments never produce change;
/// a tendered amount on them is ignored.
pub fn change_due(
    method: PaymentMethod,
    total: Money,
    tendered: Option<Money>,
) -> CoreResult<Option<Money>> {
    match method {
        PaymentMethod::Cash => {
            let tendered = tendered.ok_or_else(|| CoreError::InvalidPaymentAmount {
                reason: "tendered amount is required for cash payments".to_string(),
            })?;

            if tendered < total {
                return Err(CoreError::InvalidPaymentAmount {
                    reason: format!("tendered {} is less than total {}", tendered, total),
                });
            }

            Ok(Some(tendered - total))
        }
        PaymentMethod::Card | PaymentMethod::Other => Ok(None),
    }
}

// =============================================================================
// Document Numbers
// =============================================================================

/// Formats a receipt number: `YYYYMMDD-NNNN`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use storehub_core::pricing::receipt_number;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// assert_eq!(receipt_number(day, 7), "20240309-0007");
/// ```
pub fn receipt_number(day: NaiveDate, sequence: i64) -> String {
    format!("{}-{:04}", day.format("%Y%m%d"), sequence)
}

/// Formats a purchase order number: `PO-YYYYMMDD-XXXX`.
///
/// `suffix` is uppercased and cut to four characters; callers pass the
/// start of a fresh UUID.
pub fn po_number(day: NaiveDate, suffix: &str) -> String {
    let suffix: String = suffix
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("PO-{}-{}", day.format("%Y%m%d"), suffix)
}

/// Parses the sequence out of a receipt number issued by [`receipt_number`].
pub fn receipt_sequence(receipt: &str) -> Option<i64> {
    receipt.rsplit_once('-').and_then(|(_, seq)| seq.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_amounts() {
        let line = line_amounts(Money::from_cents(199), TaxRate::from_bps(825), 3);
        assert_eq!(line.line_total.cents(), 597);
        // 597 × 0.0825 = 49.25 → 49
        assert_eq!(line.tax.cents(), 49);
    }

    #[test]
    fn test_sale_totals() {
        let lines = [
            line_amounts(Money::from_cents(1000), TaxRate::from_bps(825), 1),
            line_amounts(Money::from_cents(250), TaxRate::zero(), 2),
        ];
        let totals = SaleTotals::from_lines(&lines);

        assert_eq!(totals.subtotal.cents(), 1500);
        assert_eq!(totals.tax.cents(), 83);
        assert_eq!(totals.total.cents(), 1583);
    }

    #[test]
    fn test_change_due_cash() {
        let change = change_due(
            PaymentMethod::Cash,
            Money::from_cents(1583),
            Some(Money::from_cents(2000)),
        )
        .unwrap();
        assert_eq!(change, Some(Money::from_cents(417)));

        let exact = change_due(
            PaymentMethod::Cash,
            Money::from_cents(500),
            Some(Money::from_cents(500)),
        )
        .unwrap();
        assert_eq!(exact, Some(Money::zero()));
    }

    #[test]
    fn test_change_due_rejects_short_cash() {
        let result = change_due(
            PaymentMethod::Cash,
            Money::from_cents(1583),
            Some(Money::from_cents(1500)),
        );
        assert!(matches!(result, Err(CoreError::InvalidPaymentAmount { .. })));

        let missing = change_due(PaymentMethod::Cash, Money::from_cents(100), None);
        assert!(missing.is_err());
    }

    #[test]
    fn test_change_due_card() {
        let change = change_due(PaymentMethod::Card, Money::from_cents(100), None).unwrap();
        assert_eq!(change, None);
    }

    #[test]
    fn test_document_numbers() {
        let day = NaiveDate::from_ymd_opt(2024, 11, 30).unwrap();
        assert_eq!(receipt_number(day, 42), "20241130-0042");
        assert_eq!(receipt_sequence("20241130-0042"), Some(42));
        assert_eq!(po_number(day, "a1b2-c3d4"), "PO-20241130-A1B2");
    }
}

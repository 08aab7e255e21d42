//! # Loyalty Rules
//!
//! Tier thresholds, earn multipliers and balance arithmetic.
//!
//! ## Tiers
//! ```text
//! lifetime points   0 ─────── 500 ─────── 2000 ─────── 5000 ──────►
//! tier              bronze     silver      gold         platinum
//! multiplier        1.00×      1.25×       1.50×        2.00×
//! ```
//! Tiers follow lifetime points, so redeeming never demotes a customer.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{LoyaltyTier, LoyaltyTransactionKind};
use crate::validation::validate_points;

/// Lifetime points needed for each tier.
pub const SILVER_THRESHOLD: i64 = 500;
pub const GOLD_THRESHOLD: i64 = 2000;
pub const PLATINUM_THRESHOLD: i64 = 5000;

/// Tier for a lifetime point total.
pub fn tier_for(lifetime_points: i64) -> LoyaltyTier {
    match lifetime_points {
        p if p >= PLATINUM_THRESHOLD => LoyaltyTier::Platinum,
        p if p >= GOLD_THRESHOLD => LoyaltyTier::Gold,
        p if p >= SILVER_THRESHOLD => LoyaltyTier::Silver,
        _ => LoyaltyTier::Bronze,
    }
}

/// Earn multiplier in basis points (10000 = 1.0×).
pub fn multiplier_bps(tier: LoyaltyTier) -> u32 {
    match tier {
        LoyaltyTier::Bronze => 10_000,
        LoyaltyTier::Silver => 12_500,
        LoyaltyTier::Gold => 15_000,
        LoyaltyTier::Platinum => 20_000,
    }
}

/// Points earned on a purchase.
///
/// `floor(total / cents_per_point)` base points, then the tier multiplier,
/// with fractional points dropped.
///
/// ```rust
/// use storehub_core::loyalty::points_for_purchase;
/// use storehub_core::types::LoyaltyTier;
///
/// // $25.99 at 100 cents per point = 25 base points; silver ×1.25 = 31
/// assert_eq!(points_for_purchase(2599, 100, LoyaltyTier::Silver), 31);
/// ```
pub fn points_for_purchase(total_cents: i64, cents_per_point: i64, tier: LoyaltyTier) -> i64 {
    if total_cents <= 0 || cents_per_point <= 0 {
        return 0;
    }

    let base = total_cents / cents_per_point;
    (base as i128 * multiplier_bps(tier) as i128 / 10_000) as i64
}

/// Value of a points balance in cents.
pub fn points_value_cents(points: i64, point_value_cents: i64) -> i64 {
    points.max(0) * point_value_cents.max(0)
}

/// Converts a requested ledger movement into a signed balance delta.
///
/// ## Rules
/// - `earn` and `redeem` take a positive amount; redeem is applied negatively
/// - `adjust` takes a non-zero signed amount
/// - at most `MAX_POINTS` either way
pub fn signed_delta(kind: LoyaltyTransactionKind, points: i64) -> CoreResult<i64> {
    validate_points("points", points)?;

    match kind {
        LoyaltyTransactionKind::Earn | LoyaltyTransactionKind::Redeem if points <= 0 => {
            Err(ValidationError::MustBePositive {
                field: "points".to_string(),
            }
            .into())
        }
        LoyaltyTransactionKind::Earn => Ok(points),
        LoyaltyTransactionKind::Redeem => Ok(-points),
        LoyaltyTransactionKind::Adjust if points == 0 => Err(ValidationError::MustBeNonZero {
            field: "points".to_string(),
        }
        .into()),
        LoyaltyTransactionKind::Adjust => Ok(points),
    }
}

/// How much a delta adds to lifetime points. Only positive earn/adjust count.
pub fn lifetime_increment(kind: LoyaltyTransactionKind, delta: i64) -> i64 {
    match kind {
        LoyaltyTransactionKind::Earn | LoyaltyTransactionKind::Adjust if delta > 0 => delta,
        _ => 0,
    }
}

/// Checks that `balance + delta` stays non-negative.
pub fn apply_delta(balance: i64, delta: i64) -> CoreResult<i64> {
    let next = balance.saturating_add(delta);
    if next < 0 {
        return Err(CoreError::InsufficientPoints {
            balance,
            requested: delta.saturating_neg(),
        });
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::scale_bps;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(tier_for(0), LoyaltyTier::Bronze);
        assert_eq!(tier_for(499), LoyaltyTier::Bronze);
        assert_eq!(tier_for(500), LoyaltyTier::Silver);
        assert_eq!(tier_for(1999), LoyaltyTier::Silver);
        assert_eq!(tier_for(2000), LoyaltyTier::Gold);
        assert_eq!(tier_for(5000), LoyaltyTier::Platinum);
    }

    #[test]
    fn test_points_for_purchase() {
        assert_eq!(points_for_purchase(2599, 100, LoyaltyTier::Bronze), 25);
        assert_eq!(points_for_purchase(2599, 100, LoyaltyTier::Gold), 37);
        assert_eq!(points_for_purchase(2599, 100, LoyaltyTier::Platinum), 50);
        assert_eq!(points_for_purchase(99, 100, LoyaltyTier::Platinum), 0);
        assert_eq!(points_for_purchase(-500, 100, LoyaltyTier::Bronze), 0);
        assert_eq!(points_for_purchase(500, 0, LoyaltyTier::Bronze), 0);
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(signed_delta(LoyaltyTransactionKind::Earn, 10).unwrap(), 10);
        assert_eq!(signed_delta(LoyaltyTransactionKind::Redeem, 10).unwrap(), -10);
        assert_eq!(signed_delta(LoyaltyTransactionKind::Adjust, -7).unwrap(), -7);

        assert!(signed_delta(LoyaltyTransactionKind::Earn, 0).is_err());
        assert!(signed_delta(LoyaltyTransactionKind::Redeem, -5).is_err());
        assert!(signed_delta(LoyaltyTransactionKind::Adjust, 0).is_err());
        assert!(signed_delta(LoyaltyTransactionKind::Adjust, i64::MIN).is_err());
        assert!(signed_delta(LoyaltyTransactionKind::Earn, i64::MAX).is_err());
    }

    #[test]
    fn test_lifetime_increment() {
        assert_eq!(lifetime_increment(LoyaltyTransactionKind::Earn, 40), 40);
        assert_eq!(lifetime_increment(LoyaltyTransactionKind::Adjust, 5), 5);
        assert_eq!(lifetime_increment(LoyaltyTransactionKind::Adjust, -5), 0);
        assert_eq!(lifetime_increment(LoyaltyTransactionKind::Redeem, -40), 0);
    }

    #[test]
    fn test_apply_delta() {
        assert_eq!(apply_delta(100, -100).unwrap(), 0);
        match apply_delta(50, -80) {
            Err(CoreError::InsufficientPoints { balance, requested }) => {
                assert_eq!(balance, 50);
                assert_eq!(requested, 80);
            }
            other => panic!("expected InsufficientPoints, got {:?}", other),
        }
    }

    #[test]
    fn test_points_value() {
        assert_eq!(points_value_cents(1234, 1), 1234);
        assert_eq!(points_value_cents(-3, 1), 0);
    }

    #[test]
    fn test_scale_matches_multiplier() {
        assert_eq!(scale_bps(100, multiplier_bps(LoyaltyTier::Silver)), 125);
    }
}

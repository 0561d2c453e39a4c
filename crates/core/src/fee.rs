//! Platform fee math.
//!
//! The fee is a fixed percentage of the dip price, rounded to the
//! nearest minor unit. It is deducted from the owner's payout and shown
//! to both sides for transparency; the claimer is always charged the
//! full dip price.

use crate::types::MinorUnits;

/// Default platform fee, in percent of the dip price.
pub const DEFAULT_PLATFORM_FEE_PERCENT: u8 = 10;

/// Compute the platform fee for `amount` minor units, rounded to the
/// nearest minor unit (half rounds up).
pub fn platform_fee(amount: MinorUnits, percent: u8) -> MinorUnits {
    (amount * percent as i64 + 50) / 100
}

/// The owner's payout after the platform fee.
pub fn owner_payout(amount: MinorUnits, percent: u8) -> MinorUnits {
    amount - platform_fee(amount, percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_percentage() {
        assert_eq!(platform_fee(500, 10), 50);
        assert_eq!(platform_fee(1000, 10), 100);
    }

    #[test]
    fn test_rounds_to_nearest_minor_unit() {
        // 999 * 10% = 99.9 -> 100; 994 * 10% = 99.4 -> 99.
        assert_eq!(platform_fee(999, 10), 100);
        assert_eq!(platform_fee(994, 10), 99);
        // Half rounds up: 5 * 10% = 0.5 -> 1.
        assert_eq!(platform_fee(5, 10), 1);
    }

    #[test]
    fn test_zero_percent() {
        assert_eq!(platform_fee(500, 0), 0);
        assert_eq!(owner_payout(500, 0), 500);
    }

    #[test]
    fn test_payout_plus_fee_equals_price() {
        for amount in [1, 5, 499, 500, 999, 12_345] {
            assert_eq!(
                owner_payout(amount, 10) + platform_fee(amount, 10),
                amount
            );
        }
    }
}

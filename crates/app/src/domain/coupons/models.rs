//! Coupon Models

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::uuids::TypedUuid;

/// Coupon UUID
pub type CouponUuid = TypedUuid<Coupon>;

/// How a coupon's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Whole percent of the subtotal, `0..=100`.
    Percentage,
    /// Flat amount in minor units.
    Fixed,
}

impl DiscountKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }

    /// Discount this kind yields for `value` against `subtotal`.
    ///
    /// Percentages round down to the minor unit. Neither kind ever exceeds
    /// the subtotal.
    #[must_use]
    pub fn discount(self, value: u64, subtotal: u64) -> u64 {
        match self {
            Self::Percentage => {
                let percent = u128::from(value.min(100));
                let amount = u128::from(subtotal) * percent / 100;

                u64::try_from(amount).unwrap_or(subtotal)
            }
            Self::Fixed => value.min(subtotal),
        }
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown discount kind: {0}")]
pub struct UnknownDiscountKind(String);

impl FromStr for DiscountKind {
    type Err = UnknownDiscountKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            other => Err(UnknownDiscountKind(other.to_string())),
        }
    }
}

/// Coupon Model
#[derive(Debug, Clone, PartialEq)]
pub struct Coupon {
    pub uuid: CouponUuid,
    pub code: String,
    pub kind: DiscountKind,
    pub value: u64,
    pub min_order_amount: u64,
    /// `None` means unlimited.
    pub max_uses: Option<u64>,
    pub used_count: u64,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Coupon Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewCoupon {
    pub uuid: CouponUuid,
    pub code: String,
    pub kind: DiscountKind,
    pub value: u64,
    pub min_order_amount: u64,
    pub max_uses: Option<u64>,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
}

/// A validated discount for a particular subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discount {
    pub coupon_uuid: CouponUuid,
    pub code: String,
    pub amount: u64,
}

/// Codes are matched case-insensitively and without surrounding whitespace.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_down() {
        assert_eq!(DiscountKind::Percentage.discount(15, 9_99), 1_49);
        assert_eq!(DiscountKind::Percentage.discount(10, 100_00), 10_00);
    }

    #[test]
    fn percentage_does_not_overflow_on_large_subtotals() {
        assert_eq!(DiscountKind::Percentage.discount(100, u64::MAX), u64::MAX);
        assert_eq!(DiscountKind::Percentage.discount(50, u64::MAX), u64::MAX / 2);
    }

    #[test]
    fn fixed_is_clamped_to_subtotal() {
        assert_eq!(DiscountKind::Fixed.discount(20_00, 15_00), 15_00);
        assert_eq!(DiscountKind::Fixed.discount(5_00, 15_00), 5_00);
    }

    #[test]
    fn kind_parses_its_own_display() {
        for kind in [DiscountKind::Percentage, DiscountKind::Fixed] {
            assert_eq!(kind.to_string().parse::<DiscountKind>().ok(), Some(kind));
        }

        assert!("bogus".parse::<DiscountKind>().is_err());
    }

    #[test]
    fn codes_are_normalized() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
    }
}

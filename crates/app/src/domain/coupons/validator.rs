//! Coupon validation.

use jiff::Timestamp;

use crate::domain::coupons::{
    errors::CouponError,
    models::{Coupon, Discount},
};

/// Check a coupon against a pre-discount subtotal at `now`.
///
/// Checks run in a fixed order and the first failure wins: existence and
/// active flag, validity window, usage cap, minimum order amount. Passing
/// validation does not redeem the coupon.
pub fn validate(
    coupon: Option<&Coupon>,
    subtotal: u64,
    now: Timestamp,
) -> Result<Discount, CouponError> {
    let coupon = coupon
        .filter(|coupon| coupon.active)
        .ok_or(CouponError::NotFound)?;

    let not_started = coupon.starts_at.is_some_and(|starts_at| now < starts_at);
    let ended = coupon.ends_at.is_some_and(|ends_at| now > ends_at);

    if not_started || ended {
        return Err(CouponError::Expired);
    }

    if coupon
        .max_uses
        .is_some_and(|max_uses| coupon.used_count >= max_uses)
    {
        return Err(CouponError::UsageExceeded);
    }

    if subtotal < coupon.min_order_amount {
        return Err(CouponError::BelowMinimum);
    }

    Ok(Discount {
        coupon_uuid: coupon.uuid,
        code: coupon.code.clone(),
        amount: coupon.kind.discount(coupon.value, subtotal),
    })
}

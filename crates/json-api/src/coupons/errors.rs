//! Errors

use salvo::http::StatusError;
use tracing::error;

use souk_app::domain::coupons::{CouponError, CouponsServiceError};

pub(crate) fn into_status_error(error: CouponsServiceError) -> StatusError {
    match error {
        CouponsServiceError::Rejected(reason) => rejection(reason),
        CouponsServiceError::AlreadyExists => {
            StatusError::conflict().brief("Coupon code already exists")
        }
        CouponsServiceError::NotFound => StatusError::not_found().brief("Coupon not found"),
        CouponsServiceError::MissingRequiredData | CouponsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid coupon payload")
        }
        CouponsServiceError::Sql(source) => {
            error!("coupon storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}

/// A coupon that cannot be applied. The detail carries a stable reason code.
pub(crate) fn rejection(reason: CouponError) -> StatusError {
    StatusError::unprocessable_entity()
        .brief(format!("Coupon rejected: {reason}"))
        .detail(reason_code(reason))
}

pub(crate) const fn reason_code(reason: CouponError) -> &'static str {
    match reason {
        CouponError::NotFound => "not_found",
        CouponError::Expired => "expired",
        CouponError::UsageExceeded => "usage_exceeded",
        CouponError::BelowMinimum => "below_minimum",
    }
}

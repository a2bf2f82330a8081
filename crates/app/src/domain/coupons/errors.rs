//! Coupon errors.

use serde::Serialize;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// Why a coupon cannot be applied to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponError {
    /// Unknown or inactive code.
    #[error("coupon not found")]
    NotFound,

    /// Outside the coupon's validity window.
    #[error("coupon expired")]
    Expired,

    #[error("coupon usage limit reached")]
    UsageExceeded,

    #[error("order subtotal is below the coupon minimum")]
    BelowMinimum,
}

#[derive(Debug, Error)]
pub enum CouponsServiceError {
    #[error(transparent)]
    Rejected(#[from] CouponError),

    #[error("coupon code already exists")]
    AlreadyExists,

    #[error("coupon not found")]
    NotFound,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CouponsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}

//! Errors

use salvo::{http::StatusError, oapi::ToSchema};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use souk_app::domain::checkout::CheckoutError;

use crate::coupons::errors::{reason_code, rejection};

pub(crate) fn into_status_error(error: CheckoutError) -> StatusError {
    match error {
        CheckoutError::EmptyCheckout => StatusError::bad_request().brief("Checkout has no lines"),
        CheckoutError::InvalidQuantity => {
            StatusError::bad_request().brief("Quantity must be at least one")
        }
        CheckoutError::AmountOverflow => StatusError::bad_request().brief("Order amount too large"),
        CheckoutError::UnknownProduct(product) => StatusError::unprocessable_entity()
            .brief("Product not available from this shop")
            .detail(product.to_string()),
        CheckoutError::InsufficientStock(product) => StatusError::conflict()
            .brief("Insufficient stock")
            .detail(product.to_string()),
        CheckoutError::Coupon(reason) => rejection(reason),
        CheckoutError::OrderNumberGenerationFailed => {
            error!("exhausted order number attempts");

            StatusError::service_unavailable().brief("Could not allocate an order number")
        }
        CheckoutError::TimedOut => StatusError::service_unavailable().brief("Checkout timed out"),
        CheckoutError::PersistenceUnavailable(source) => {
            error!("checkout storage failure: {source}");

            StatusError::service_unavailable()
        }
    }
}

/// A failed checkout reported inside a multi-shop response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutFailure {
    /// Stable failure code, such as `insufficient_stock`
    pub code: String,

    /// Human readable description
    pub message: String,

    /// Product at fault, for stock and availability failures
    pub product_uuid: Option<Uuid>,

    /// Coupon rejection reason, for coupon failures
    pub coupon_reason: Option<String>,
}

impl From<&CheckoutError> for CheckoutFailure {
    fn from(error: &CheckoutError) -> Self {
        let product_uuid = match error {
            CheckoutError::UnknownProduct(product) | CheckoutError::InsufficientStock(product) => {
                Some(product.into_uuid())
            }
            _ => None,
        };

        let coupon_reason = match error {
            CheckoutError::Coupon(reason) => Some(reason_code(*reason).to_string()),
            _ => None,
        };

        Self {
            code: error.outcome().to_string(),
            message: error.to_string(),
            product_uuid,
            coupon_reason,
        }
    }
}

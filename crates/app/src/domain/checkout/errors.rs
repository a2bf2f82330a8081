//! Checkout errors.

use sqlx::Error;
use thiserror::Error;

use crate::domain::{
    coupons::errors::CouponError, orders::factory::OrderFactoryError,
    products::models::ProductUuid, stock::errors::StockError,
};

/// `57014`: statement cancelled by `statement_timeout`.
const QUERY_CANCELED: &str = "57014";

/// `55P03`: lock wait exceeded `lock_timeout`.
const LOCK_NOT_AVAILABLE: &str = "55P03";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("checkout has no lines")]
    EmptyCheckout,

    #[error("quantity must be at least one")]
    InvalidQuantity,

    /// The product does not exist or is not sold by the shop being checked out.
    #[error("product {0} is not available from this shop")]
    UnknownProduct(ProductUuid),

    #[error("insufficient stock for product {0}")]
    InsufficientStock(ProductUuid),

    #[error("coupon rejected: {0}")]
    Coupon(#[from] CouponError),

    #[error("could not allocate a unique order number")]
    OrderNumberGenerationFailed,

    #[error("order amount overflows")]
    AmountOverflow,

    #[error("checkout timed out")]
    TimedOut,

    #[error("storage unavailable")]
    PersistenceUnavailable(#[source] Error),
}

impl CheckoutError {
    /// Short, stable label for metrics and logs.
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::EmptyCheckout => "empty_checkout",
            Self::InvalidQuantity => "invalid_quantity",
            Self::UnknownProduct(_) => "unknown_product",
            Self::InsufficientStock(_) => "insufficient_stock",
            Self::Coupon(_) => "coupon_rejected",
            Self::OrderNumberGenerationFailed => "order_number_exhausted",
            Self::AmountOverflow => "amount_overflow",
            Self::TimedOut => "timed_out",
            Self::PersistenceUnavailable(_) => "persistence_unavailable",
        }
    }
}

impl From<Error> for CheckoutError {
    fn from(error: Error) -> Self {
        let code = error
            .as_database_error()
            .and_then(|e| e.code())
            .map(|code| code.into_owned());

        match code.as_deref() {
            Some(QUERY_CANCELED | LOCK_NOT_AVAILABLE) => Self::TimedOut,
            _ => Self::PersistenceUnavailable(error),
        }
    }
}

impl From<StockError> for CheckoutError {
    fn from(error: StockError) -> Self {
        match error {
            StockError::InvalidQuantity => Self::InvalidQuantity,
            StockError::NotFound(product) => Self::UnknownProduct(product),
            StockError::OutOfRange => Self::AmountOverflow,
            StockError::Sql(error) => Self::from(error),
        }
    }
}

impl From<OrderFactoryError> for CheckoutError {
    fn from(error: OrderFactoryError) -> Self {
        match error {
            OrderFactoryError::Empty => Self::EmptyCheckout,
            OrderFactoryError::AmountOverflow => Self::AmountOverflow,
        }
    }
}

//! Stock ledger errors.

use sqlx::Error;
use thiserror::Error;

use crate::domain::products::models::ProductUuid;

#[derive(Debug, Error)]
pub enum StockError {
    /// Requested quantity was zero.
    #[error("quantity must be at least one")]
    InvalidQuantity,

    /// The product does not exist.
    #[error("product {0} not found")]
    NotFound(ProductUuid),

    /// Applying the change would overflow the stored counter.
    #[error("quantity out of range")]
    OutOfRange,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for StockError {
    fn from(error: Error) -> Self {
        Self::Sql(error)
    }
}

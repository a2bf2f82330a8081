//! Stock Models

use crate::domain::products::models::ProductUuid;

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// Stock was decremented. `unit_price` is the product price read by the same statement.
    Reserved { unit_price: u64 },

    /// Fewer units were available than requested; nothing was changed.
    InsufficientStock,
}

impl Reservation {
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved { .. })
    }
}

/// Current ledger counters for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub product: ProductUuid,
    pub stock: u64,
    pub sales: u64,
}

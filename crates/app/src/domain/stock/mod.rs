//! Stock
//!
//! The ledger is the only writer of a product's `stock` and `sales` columns.
//! Every change is one conditional `UPDATE`, so the check and the write can
//! never be separated by a concurrent checkout.

pub mod errors;
pub(crate) mod ledger;
pub mod models;
pub mod service;

pub use errors::StockError;
pub use service::*;

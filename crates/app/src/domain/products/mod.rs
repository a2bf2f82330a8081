//! Products
//!
//! The catalog-facing read side of a product: price, owning shop and the
//! stock/sales counters maintained by the ledger.

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;

pub use errors::ProductsServiceError;
pub use service::*;

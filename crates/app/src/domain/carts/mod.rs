//! Carts
//!
//! A buyer's staging area for prospective purchases. Nothing here is checked
//! against live stock; availability is only decided at checkout.

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;
pub mod variation;

pub use errors::CartsServiceError;
pub use service::*;

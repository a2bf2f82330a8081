//! Coupons
//!
//! Discount codes redeemed at checkout. Validation is pure; redemption is a
//! conditional increment of the usage counter performed inside the order's
//! transaction.

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;
pub mod validator;

pub use errors::{CouponError, CouponsServiceError};
pub use service::*;

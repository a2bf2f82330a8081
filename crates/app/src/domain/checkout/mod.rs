//! Checkout
//!
//! Turns a set of lines into exactly one order, or into nothing at all.
//! Stock reservations, coupon redemption, the order header and its lines
//! and the sales counters are written in one bounded transaction. Cart
//! cleanup and notification happen only after that transaction commits.

pub mod errors;
pub mod models;
pub mod service;

pub use errors::CheckoutError;
pub use service::*;

//! Coupon Handlers

pub(crate) mod quote;

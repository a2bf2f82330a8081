//! Marketplace order-placement and inventory-consistency engine.
//!
//! Stock, carts, coupons and orders live in `PostgreSQL`. Every write to
//! contended state (product stock, coupon usage) is a single conditional
//! statement executed inside the checkout transaction that creates the order.

pub mod context;
pub mod database;
pub mod domain;
pub mod uuids;

#[cfg(test)]
mod test;

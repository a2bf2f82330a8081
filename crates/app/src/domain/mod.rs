//! Marketplace Domain Concerns

pub mod amounts;
pub mod carts;
pub mod checkout;
pub mod coupons;
pub mod notifications;
pub mod orders;
pub mod parties;
pub mod products;
pub mod stock;

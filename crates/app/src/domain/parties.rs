//! Buyers and shops.
//!
//! Both are owned by the identity service; this crate only ever sees their
//! identifiers, already authenticated.

use crate::uuids::TypedUuid;

/// Buyer marker
#[derive(Debug)]
pub struct Buyer;

/// Buyer UUID
pub type BuyerUuid = TypedUuid<Buyer>;

/// Shop marker
#[derive(Debug)]
pub struct Shop;

/// Shop UUID
pub type ShopUuid = TypedUuid<Shop>;

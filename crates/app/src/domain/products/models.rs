//! Product Models

use jiff::Timestamp;

use crate::{domain::parties::ShopUuid, uuids::TypedUuid};

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Product Model
#[derive(Debug, Clone)]
pub struct Product {
    pub uuid: ProductUuid,
    pub shop_uuid: ShopUuid,
    /// Current catalog price in minor units.
    pub price: u64,
    /// Units available for reservation.
    pub stock: u64,
    /// Units sold over the product's lifetime.
    pub sales: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Product Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub shop_uuid: ShopUuid,
    pub price: u64,
    pub stock: u64,
}

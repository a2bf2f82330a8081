//! Notification payloads.

use jiff::Timestamp;
use serde::Serialize;

use crate::domain::{
    orders::models::{Order, OrderNumber, OrderUuid},
    parties::{BuyerUuid, ShopUuid},
};

/// Sent once an order has been committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPlaced {
    pub order_uuid: OrderUuid,
    pub order_number: OrderNumber,
    pub buyer_uuid: BuyerUuid,
    pub shop_uuid: ShopUuid,
    pub total: u64,
    pub placed_at: Timestamp,
}

impl From<&Order> for OrderPlaced {
    fn from(order: &Order) -> Self {
        Self {
            order_uuid: order.uuid,
            order_number: order.order_number.clone(),
            buyer_uuid: order.buyer_uuid,
            shop_uuid: order.shop_uuid,
            total: order.total,
            placed_at: order.created_at,
        }
    }
}

//! Checkout Models

use serde::Serialize;

use crate::domain::{
    carts::variation::Variation,
    checkout::errors::CheckoutError,
    orders::models::{OrderNumber, OrderUuid, ShippingAddress},
    parties::{BuyerUuid, ShopUuid},
    products::models::ProductUuid,
};

/// One requested line. The same product may appear on several lines.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutLine {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub variation: Option<Variation>,
}

/// Order details supplied by the buyer.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutDetails {
    pub shipping_address: ShippingAddress,
    /// Opaque tag such as `card` or `cod`; payment itself happens elsewhere.
    pub payment_method: String,
    pub coupon_code: Option<String>,
}

/// A checkout of explicit lines against a single shop.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub buyer_uuid: BuyerUuid,
    pub shop_uuid: ShopUuid,
    pub lines: Vec<CheckoutLine>,
    pub details: CheckoutDetails,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedOrder {
    pub order_uuid: OrderUuid,
    pub order_number: OrderNumber,
    pub total: u64,
}

/// Outcome of one shop's share of a multi-shop cart checkout.
#[derive(Debug)]
pub struct ShopCheckout {
    pub shop_uuid: ShopUuid,
    pub outcome: Result<PlacedOrder, CheckoutError>,
}

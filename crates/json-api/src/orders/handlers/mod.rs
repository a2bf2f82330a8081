//! Order Handlers

pub(crate) mod cancel;
pub(crate) mod get;
pub(crate) mod index;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souk_app::domain::orders::models::{Order, ShippingAddress};

/// Shipping Address
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct ShippingAddressBody {
    pub recipient: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
}

impl From<ShippingAddressBody> for ShippingAddress {
    fn from(body: ShippingAddressBody) -> Self {
        ShippingAddress {
            recipient: body.recipient,
            line1: body.line1,
            line2: body.line2,
            city: body.city,
            region: body.region,
            postal_code: body.postal_code,
            country: body.country,
        }
    }
}

impl From<ShippingAddress> for ShippingAddressBody {
    fn from(address: ShippingAddress) -> Self {
        Self {
            recipient: address.recipient,
            line1: address.line1,
            line2: address.line2,
            city: address.city,
            region: address.region,
            postal_code: address.postal_code,
            country: address.country,
        }
    }
}

/// Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    pub uuid: Uuid,
    pub order_number: String,
    pub shop_uuid: Uuid,
    pub coupon_uuid: Option<Uuid>,
    pub subtotal: u64,
    pub discount: u64,
    pub total: u64,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub shipping_address: ShippingAddressBody,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            uuid: order.uuid.into_uuid(),
            order_number: order.order_number.as_str().to_string(),
            shop_uuid: order.shop_uuid.into_uuid(),
            coupon_uuid: order.coupon_uuid.map(Into::into),
            subtotal: order.subtotal,
            discount: order.discount,
            total: order.total,
            status: order.status.to_string(),
            payment_status: order.payment_status.to_string(),
            payment_method: order.payment_method,
            shipping_address: order.shipping_address.into(),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
        }
    }
}

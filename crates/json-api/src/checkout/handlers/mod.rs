//! Checkout Handlers

pub(crate) mod all;
pub(crate) mod cart;
pub(crate) mod create;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souk_app::domain::checkout::{
    CheckoutError,
    models::{CheckoutDetails, PlacedOrder},
};

use crate::{observability::observe_checkout, orders::ShippingAddressBody};

/// Checkout Details
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutDetailsRequest {
    pub shipping_address: ShippingAddressBody,

    /// Payment method tag, such as `card` or `cod`
    pub payment_method: String,

    /// Optional coupon code
    #[serde(default)]
    pub coupon_code: Option<String>,
}

impl From<CheckoutDetailsRequest> for CheckoutDetails {
    fn from(request: CheckoutDetailsRequest) -> Self {
        CheckoutDetails {
            shipping_address: request.shipping_address.into(),
            payment_method: request.payment_method,
            coupon_code: request.coupon_code,
        }
    }
}

/// Placed Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PlacedOrderResponse {
    pub order_uuid: Uuid,
    pub order_number: String,
    /// Amount payable after discounts, in minor units
    pub total: u64,
}

impl From<PlacedOrder> for PlacedOrderResponse {
    fn from(placed: PlacedOrder) -> Self {
        Self {
            order_uuid: placed.order_uuid.into_uuid(),
            order_number: placed.order_number.to_string(),
            total: placed.total,
        }
    }
}

fn observe_outcome(outcome: &Result<PlacedOrder, CheckoutError>) {
    match outcome {
        Ok(_) => observe_checkout("placed"),
        Err(error) => observe_checkout(error.outcome()),
    }
}

//! Get Cart Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souk_app::domain::carts::models::{CartLineView, CartSnapshot};

use crate::{
    carts::{errors::into_status_error, handlers::CartLineResponse},
    extensions::*,
    state::State,
};

/// Priced Cart Line
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PricedCartLineResponse {
    #[serde(flatten)]
    pub line: CartLineResponse,

    /// Shop selling the product
    pub shop_uuid: Uuid,

    /// Current catalog price, in minor units
    pub unit_price: u64,

    /// `unit_price * quantity`
    pub subtotal: u64,
}

impl From<CartLineView> for PricedCartLineResponse {
    fn from(view: CartLineView) -> Self {
        Self {
            line: view.line.into(),
            shop_uuid: view.shop_uuid.into_uuid(),
            unit_price: view.unit_price,
            subtotal: view.subtotal,
        }
    }
}

/// Cart Response
///
/// Prices are indicative; the order is priced again at checkout.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    pub lines: Vec<PricedCartLineResponse>,
    pub total_items: u64,
    pub total_amount: u64,
}

impl From<CartSnapshot> for CartResponse {
    fn from(cart: CartSnapshot) -> Self {
        Self {
            lines: cart.lines.into_iter().map(Into::into).collect(),
            total_items: cart.total_items,
            total_amount: cart.total_amount,
        }
    }
}

/// Get Cart Handler
#[endpoint(
    tags("carts"),
    summary = "Get Cart",
    responses(
        (status_code = StatusCode::OK, description = "The buyer's cart"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing buyer identity"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;

    let cart = state
        .app
        .carts
        .get_cart(buyer)
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}

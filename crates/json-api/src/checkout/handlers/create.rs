//! Create Checkout Handler

use std::{collections::BTreeMap, sync::Arc};

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souk_app::domain::{
    carts::variation::Variation,
    checkout::models::{CheckoutLine, CheckoutRequest},
    parties::BuyerUuid,
};

use crate::{
    checkout::{
        errors::into_status_error,
        handlers::{CheckoutDetailsRequest, PlacedOrderResponse, observe_outcome},
    },
    extensions::*,
    state::State,
};

/// Checkout Line
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutLineRequest {
    pub product_uuid: Uuid,
    pub quantity: u32,
    #[serde(default)]
    pub variation: Option<BTreeMap<String, String>>,
}

impl From<CheckoutLineRequest> for CheckoutLine {
    fn from(line: CheckoutLineRequest) -> Self {
        CheckoutLine {
            product_uuid: line.product_uuid.into(),
            quantity: line.quantity,
            variation: line.variation.map(Variation::from),
        }
    }
}

/// Create Checkout Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateCheckoutRequest {
    /// Shop every line must belong to
    pub shop_uuid: Uuid,

    pub lines: Vec<CheckoutLineRequest>,

    #[serde(flatten)]
    pub details: CheckoutDetailsRequest,
}

impl CreateCheckoutRequest {
    fn into_checkout_request(self, buyer: BuyerUuid) -> CheckoutRequest {
        CheckoutRequest {
            buyer_uuid: buyer,
            shop_uuid: self.shop_uuid.into(),
            lines: self.lines.into_iter().map(Into::into).collect(),
            details: self.details.into(),
        }
    }
}

/// Create Checkout Handler
///
/// Places one order for explicit lines from a single shop. Either every line
/// is reserved and the order exists, or nothing changes.
#[endpoint(
    tags("checkout"),
    summary = "Place Order",
    responses(
        (status_code = StatusCode::CREATED, description = "Order placed"),
        (status_code = StatusCode::CONFLICT, description = "Insufficient stock"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Coupon or product rejected"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Checkout could not complete"),
    ),
)]
#[tracing::instrument(
    name = "checkout.create",
    skip(json, depot, res),
    fields(buyer_uuid = tracing::field::Empty, shop_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateCheckoutRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<PlacedOrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;
    let request = json.into_inner();

    let span = tracing::Span::current();

    span.record("buyer_uuid", tracing::field::display(buyer));
    span.record("shop_uuid", tracing::field::display(request.shop_uuid));

    let outcome = state
        .app
        .checkout
        .checkout(request.into_checkout_request(buyer))
        .await;

    observe_outcome(&outcome);

    let placed = outcome.map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/orders/{}", placed.order_uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(placed.into()))
}

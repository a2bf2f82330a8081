//! Add Cart Line Handler

use std::{collections::BTreeMap, sync::Arc};

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souk_app::domain::carts::{
    models::{CartLineUuid, NewCartLine},
    variation::Variation,
};

use crate::{
    carts::{errors::into_status_error, handlers::CartLineResponse},
    extensions::*,
    state::State,
};

/// Add Cart Line Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddCartLineRequest {
    /// Product UUID
    pub product_uuid: Uuid,

    /// Units to add; merged into an existing line for the same variation
    pub quantity: u32,

    /// Chosen attributes; attribute order does not matter
    #[serde(default)]
    pub variation: Option<BTreeMap<String, String>>,
}

impl From<AddCartLineRequest> for NewCartLine {
    fn from(request: AddCartLineRequest) -> Self {
        NewCartLine {
            uuid: CartLineUuid::new(),
            product_uuid: request.product_uuid.into(),
            quantity: request.quantity,
            variation: request.variation.map(Variation::from),
        }
    }
}

/// Add Cart Line Handler
#[endpoint(
    tags("carts"),
    summary = "Add Cart Line",
    responses(
        (status_code = StatusCode::CREATED, description = "Line added or merged"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing buyer identity"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "carts.lines.add",
    skip(json, depot, res),
    fields(buyer_uuid = tracing::field::Empty, product_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<AddCartLineRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CartLineResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;
    let request = json.into_inner();

    let span = tracing::Span::current();

    span.record("buyer_uuid", tracing::field::display(buyer));
    span.record("product_uuid", tracing::field::display(request.product_uuid));

    let line = state
        .app
        .carts
        .add_line(buyer, request.into())
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/cart/lines/{}", line.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(line.into()))
}

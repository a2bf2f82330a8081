//! Update Cart Line Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    carts::{errors::into_status_error, handlers::CartLineResponse},
    extensions::*,
    state::State,
};

/// Update Cart Line Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateCartLineRequest {
    /// New quantity; zero removes the line
    pub quantity: u32,
}

/// Update Cart Line Handler
#[endpoint(
    tags("carts"),
    summary = "Update Cart Line",
    responses(
        (status_code = StatusCode::OK, description = "Quantity replaced", body = CartLineResponse),
        (status_code = StatusCode::NO_CONTENT, description = "Line removed"),
        (status_code = StatusCode::NOT_FOUND, description = "Cart line not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    line: PathParam<Uuid>,
    json: JsonBody<UpdateCartLineRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<(), StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;

    let updated = state
        .app
        .carts
        .set_quantity(buyer, line.into_inner().into(), json.into_inner().quantity)
        .await
        .map_err(into_status_error)?;

    match updated {
        Some(line) => res.render(Json(CartLineResponse::from(line))),
        None => {
            res.status_code(StatusCode::NO_CONTENT);
        }
    }

    Ok(())
}

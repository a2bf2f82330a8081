//! Clear Cart Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{carts::errors::into_status_error, extensions::*, state::State};

/// Cart Cleared Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartClearedResponse {
    /// Number of lines removed
    pub removed: u64,
}

/// Clear Cart Handler
#[endpoint(
    tags("carts"),
    summary = "Clear Cart",
    responses(
        (status_code = StatusCode::OK, description = "Cart emptied"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing buyer identity"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartClearedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;

    let removed = state
        .app
        .carts
        .clear_cart(buyer)
        .await
        .map_err(into_status_error)?;

    Ok(Json(CartClearedResponse { removed }))
}

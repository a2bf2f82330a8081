//! Cancel Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, handlers::OrderResponse},
    state::State,
};

/// Cancel Order Handler
///
/// Pending and processing orders can be cancelled; their units return to stock.
#[endpoint(
    tags("orders"),
    summary = "Cancel Order",
    responses(
        (status_code = StatusCode::OK, description = "Order cancelled"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order can no longer be cancelled"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.cancel",
    skip(order, depot),
    fields(
        buyer_uuid = tracing::field::Empty,
        order_uuid = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;
    let order = order.into_inner();

    let span = tracing::Span::current();

    span.record("buyer_uuid", tracing::field::display(buyer));
    span.record("order_uuid", tracing::field::display(order));

    let cancelled = state
        .app
        .orders
        .cancel_order(buyer, order.into())
        .await
        .map_err(into_status_error)?;

    tracing::info!(order_number = %cancelled.order_number, "cancelled order");

    Ok(Json(cancelled.into()))
}

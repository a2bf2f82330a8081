//! Remove Cart Line Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{carts::errors::into_status_error, extensions::*, state::State};

/// Remove Cart Line Handler
#[endpoint(
    tags("carts"),
    summary = "Remove Cart Line",
    responses(
        (status_code = StatusCode::OK, description = "Cart line removed"),
        (status_code = StatusCode::NOT_FOUND, description = "Cart line not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "carts.lines.remove",
    skip(line, depot),
    fields(
        buyer_uuid = tracing::field::Empty,
        line_uuid = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    line: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;
    let line = line.into_inner();

    let span = tracing::Span::current();

    span.record("buyer_uuid", tracing::field::display(buyer));
    span.record("line_uuid", tracing::field::display(line));

    state
        .app
        .carts
        .remove_line(buyer, line.into())
        .await
        .map_err(into_status_error)?;

    tracing::info!(line_uuid = %line, "removed cart line");

    Ok(StatusCode::OK)
}

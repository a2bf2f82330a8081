//! Product Stock Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souk_app::domain::stock::models::StockLevel;

use crate::{extensions::*, products::errors::into_status_error, state::State};

/// Stock Level Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct StockLevelResponse {
    /// Product UUID
    pub product_uuid: Uuid,

    /// Units available to reserve
    pub stock: u64,

    /// Units sold over the product's lifetime
    pub sales: u64,
}

impl From<StockLevel> for StockLevelResponse {
    fn from(level: StockLevel) -> Self {
        Self {
            product_uuid: level.product.into_uuid(),
            stock: level.stock,
            sales: level.sales,
        }
    }
}

/// Product Stock Handler
///
/// Returns the current stock and sales counters for a product. The figure is
/// informational; availability is only decided at checkout.
#[endpoint(
    tags("products"),
    summary = "Get Product Stock",
    responses(
        (status_code = StatusCode::OK, description = "Stock level"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<StockLevelResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let level = state
        .app
        .stock
        .stock_level(product.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(level.into()))
}

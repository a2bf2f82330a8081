//! Quote Coupon Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{coupons::errors::into_status_error, extensions::*, state::State};

/// Quote Coupon Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct QuoteCouponRequest {
    /// Coupon code, matched case-insensitively
    pub code: String,

    /// Order subtotal in minor units
    pub subtotal: u64,
}

/// Coupon Quote Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CouponQuoteResponse {
    pub coupon_uuid: Uuid,
    pub code: String,
    pub discount: u64,
    /// `subtotal - discount`
    pub total: u64,
}

/// Quote Coupon Handler
///
/// Reports the discount a code would give without redeeming it. The coupon is
/// checked again when the order is placed.
#[endpoint(
    tags("coupons"),
    summary = "Quote Coupon",
    responses(
        (status_code = StatusCode::OK, description = "Discount that would apply"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Coupon cannot be applied"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<QuoteCouponRequest>,
    depot: &mut Depot,
) -> Result<Json<CouponQuoteResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();

    let discount = state
        .app
        .coupons
        .quote(request.code, request.subtotal)
        .await
        .map_err(into_status_error)?;

    Ok(Json(CouponQuoteResponse {
        coupon_uuid: discount.coupon_uuid.into_uuid(),
        code: discount.code,
        discount: discount.amount,
        total: request.subtotal.saturating_sub(discount.amount),
    }))
}

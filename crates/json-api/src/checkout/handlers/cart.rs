//! Checkout Cart Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};
use uuid::Uuid;

use crate::{
    checkout::{
        errors::into_status_error,
        handlers::{CheckoutDetailsRequest, PlacedOrderResponse, observe_outcome},
    },
    extensions::*,
    state::State,
};

/// Checkout Cart Handler
///
/// Places an order for the buyer's cart lines sold by one shop.
#[endpoint(
    tags("checkout"),
    summary = "Check Out Shop Cart",
    responses(
        (status_code = StatusCode::CREATED, description = "Order placed"),
        (status_code = StatusCode::CONFLICT, description = "Insufficient stock"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Coupon or product rejected"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Checkout could not complete"),
    ),
)]
#[tracing::instrument(
    name = "checkout.cart",
    skip(shop, json, depot, res),
    fields(buyer_uuid = tracing::field::Empty, shop_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    shop: PathParam<Uuid>,
    json: JsonBody<CheckoutDetailsRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<PlacedOrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;
    let shop = shop.into_inner();

    let span = tracing::Span::current();

    span.record("buyer_uuid", tracing::field::display(buyer));
    span.record("shop_uuid", tracing::field::display(shop));

    let outcome = state
        .app
        .checkout
        .checkout_cart(buyer, shop.into(), json.into_inner().into())
        .await;

    observe_outcome(&outcome);

    let placed = outcome.map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/orders/{}", placed.order_uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(placed.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souk_app::domain::{
        checkout::{CheckoutError, MockCheckoutService},
        parties::ShopUuid,
    };

    use crate::{
        checkout::handlers::tests::{details_json, make_placed_order},
        test_helpers::{TEST_BUYER_UUID, checkout_service},
    };

    use super::*;

    fn make_service(checkout: MockCheckoutService) -> Service {
        checkout_service(
            checkout,
            Router::with_path("shops/{shop}/checkout").post(handler),
        )
    }

    #[tokio::test]
    async fn test_checkout_cart_for_shop() -> TestResult {
        let shop = ShopUuid::new();
        let placed = make_placed_order(3_000);
        let order_uuid = placed.order_uuid;

        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_checkout_cart()
            .once()
            .withf(move |buyer, s, details| {
                *buyer == TEST_BUYER_UUID && *s == shop && details.coupon_code.is_none()
            })
            .return_once(move |_, _, _| Ok(placed));

        checkout.expect_checkout().never();

        let mut res = TestClient::post(format!("http://example.com/shops/{shop}/checkout"))
            .json(&details_json(None))
            .send(&make_service(checkout))
            .await;

        let body: PlacedOrderResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(body.order_uuid, order_uuid.into_uuid());
        assert_eq!(body.total, 3_000);

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_shop_cart_returns_400() -> TestResult {
        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_checkout_cart()
            .once()
            .return_once(|_, _, _| Err(CheckoutError::EmptyCheckout));

        let res = TestClient::post(format!(
            "http://example.com/shops/{}/checkout",
            ShopUuid::new()
        ))
        .json(&details_json(None))
        .send(&make_service(checkout))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}

//! Checkout All Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souk_app::domain::checkout::models::ShopCheckout;

use crate::{
    checkout::{
        errors::{CheckoutFailure, into_status_error},
        handlers::{CheckoutDetailsRequest, PlacedOrderResponse, observe_outcome},
    },
    extensions::*,
    state::State,
};

/// Outcome for one shop's part of the cart.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ShopCheckoutResponse {
    pub shop_uuid: Uuid,
    pub order: Option<PlacedOrderResponse>,
    pub error: Option<CheckoutFailure>,
}

impl From<ShopCheckout> for ShopCheckoutResponse {
    fn from(checkout: ShopCheckout) -> Self {
        let shop_uuid = checkout.shop_uuid.into_uuid();

        match checkout.outcome {
            Ok(placed) => Self {
                shop_uuid,
                order: Some(placed.into()),
                error: None,
            },
            Err(error) => Self {
                shop_uuid,
                order: None,
                error: Some(CheckoutFailure::from(&error)),
            },
        }
    }
}

/// Checkout All Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutAllResponse {
    /// One entry per shop, in the order the shops first appear in the cart
    pub shops: Vec<ShopCheckoutResponse>,
}

/// Checkout All Handler
///
/// Splits the buyer's cart by shop and places an order per shop. Each shop
/// succeeds or fails on its own.
#[endpoint(
    tags("checkout"),
    summary = "Check Out Whole Cart",
    responses(
        (status_code = StatusCode::OK, description = "Per-shop outcomes"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Cart could not be read"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CheckoutDetailsRequest>,
    depot: &mut Depot,
) -> Result<Json<CheckoutAllResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;

    let outcomes = state
        .app
        .checkout
        .checkout_all(buyer, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    for outcome in &outcomes {
        observe_outcome(&outcome.outcome);
    }

    Ok(Json(CheckoutAllResponse {
        shops: outcomes.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souk_app::domain::{
        checkout::{CheckoutError, MockCheckoutService},
        parties::ShopUuid,
        products::models::ProductUuid,
    };

    use crate::{
        checkout::handlers::tests::{details_json, make_placed_order},
        test_helpers::{TEST_BUYER_UUID, checkout_service},
    };

    use super::*;

    fn make_service(checkout: MockCheckoutService) -> Service {
        checkout_service(checkout, Router::with_path("checkout/all").post(handler))
    }

    #[tokio::test]
    async fn test_checkout_all_reports_each_shop() -> TestResult {
        let placed_shop = ShopUuid::new();
        let failed_shop = ShopUuid::new();
        let product = ProductUuid::new();
        let placed = make_placed_order(2_000);
        let order_uuid = placed.order_uuid;

        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_checkout_all()
            .once()
            .withf(|buyer, details| {
                *buyer == TEST_BUYER_UUID && details.coupon_code.as_deref() == Some("SAVE10")
            })
            .return_once(move |_, _| {
                Ok(vec![
                    ShopCheckout {
                        shop_uuid: placed_shop,
                        outcome: Ok(placed),
                    },
                    ShopCheckout {
                        shop_uuid: failed_shop,
                        outcome: Err(CheckoutError::InsufficientStock(product)),
                    },
                ])
            });

        let mut res = TestClient::post("http://example.com/checkout/all")
            .json(&details_json(Some("SAVE10")))
            .send(&make_service(checkout))
            .await;

        let body: CheckoutAllResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let [first, second] = body.shops.as_slice() else {
            return Err("expected two shop outcomes".into());
        };

        assert_eq!(first.shop_uuid, placed_shop.into_uuid());
        assert_eq!(
            first.order.as_ref().map(|order| order.order_uuid),
            Some(order_uuid.into_uuid())
        );
        assert!(first.error.is_none(), "first shop should have succeeded");

        assert_eq!(second.shop_uuid, failed_shop.into_uuid());
        assert!(second.order.is_none(), "second shop should have failed");

        let error = second.error.as_ref().ok_or("expected failure details")?;

        assert_eq!(error.code, "insufficient_stock");
        assert_eq!(error.product_uuid, Some(product.into_uuid()));

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_cart_returns_400() -> TestResult {
        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_checkout_all()
            .once()
            .return_once(|_, _| Err(CheckoutError::EmptyCheckout));

        let res = TestClient::post("http://example.com/checkout/all")
            .json(&details_json(None))
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}

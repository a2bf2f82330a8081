//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use souk_app::{
    context::AppContext,
    domain::{
        carts::{
            MockCartsService,
            models::{CartLine, CartLineUuid, CartLineView, CartSnapshot},
        },
        checkout::MockCheckoutService,
        coupons::MockCouponsService,
        orders::{
            MockOrdersService,
            models::{
                Order, OrderNumber, OrderStatus, OrderUuid, PaymentStatus, ShippingAddress,
            },
        },
        parties::{BuyerUuid, ShopUuid},
        products::{MockProductsService, models::ProductUuid},
        stock::MockStockService,
    },
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_BUYER_UUID: BuyerUuid = BuyerUuid::from_uuid(Uuid::nil());

#[salvo::handler]
pub(crate) async fn inject_buyer(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_buyer_uuid(TEST_BUYER_UUID);
    ctrl.call_next(req, depot, res).await;
}

/// Service mocks backing a test [`State`]. Unset mocks reject every call.
#[derive(Default)]
pub(crate) struct TestApp {
    pub(crate) products: MockProductsService,
    pub(crate) stock: MockStockService,
    pub(crate) carts: MockCartsService,
    pub(crate) coupons: MockCouponsService,
    pub(crate) orders: MockOrdersService,
    pub(crate) checkout: MockCheckoutService,
}

impl TestApp {
    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(AppContext {
            products: Arc::new(self.products),
            stock: Arc::new(self.stock),
            carts: Arc::new(self.carts),
            coupons: Arc::new(self.coupons),
            orders: Arc::new(self.orders),
            checkout: Arc::new(self.checkout),
        })
    }

    /// Serve `route` as an authenticated buyer.
    pub(crate) fn service(self, route: Router) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(self.into_state()))
                .hoop(inject_buyer)
                .push(route),
        )
    }
}

pub(crate) fn carts_service(carts: MockCartsService, route: Router) -> Service {
    TestApp {
        carts,
        ..TestApp::default()
    }
    .service(route)
}

pub(crate) fn checkout_service(checkout: MockCheckoutService, route: Router) -> Service {
    TestApp {
        checkout,
        ..TestApp::default()
    }
    .service(route)
}

pub(crate) fn orders_service(orders: MockOrdersService, route: Router) -> Service {
    TestApp {
        orders,
        ..TestApp::default()
    }
    .service(route)
}

pub(crate) fn coupons_service(coupons: MockCouponsService, route: Router) -> Service {
    TestApp {
        coupons,
        ..TestApp::default()
    }
    .service(route)
}

pub(crate) fn stock_service(stock: MockStockService, route: Router) -> Service {
    TestApp {
        stock,
        ..TestApp::default()
    }
    .service(route)
}

pub(crate) fn make_cart_line(product: ProductUuid, quantity: u32) -> CartLine {
    CartLine {
        uuid: CartLineUuid::new(),
        buyer_uuid: TEST_BUYER_UUID,
        product_uuid: product,
        variation: None,
        quantity,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_cart(lines: Vec<(ShopUuid, CartLine, u64)>) -> CartSnapshot {
    let lines: Vec<CartLineView> = lines
        .into_iter()
        .map(|(shop_uuid, line, unit_price)| CartLineView {
            subtotal: unit_price * u64::from(line.quantity),
            line,
            shop_uuid,
            unit_price,
        })
        .collect();

    CartSnapshot {
        buyer_uuid: TEST_BUYER_UUID,
        total_items: lines.iter().map(|view| u64::from(view.line.quantity)).sum(),
        total_amount: lines.iter().map(|view| view.subtotal).sum(),
        lines,
    }
}

pub(crate) fn make_order(uuid: OrderUuid, status: OrderStatus) -> Order {
    Order {
        uuid,
        order_number: OrderNumber::new("ORD-20260101-ABCDEFGH"),
        buyer_uuid: TEST_BUYER_UUID,
        shop_uuid: ShopUuid::new(),
        coupon_uuid: None,
        subtotal: 3_000,
        discount: 0,
        total: 3_000,
        status,
        payment_status: PaymentStatus::Pending,
        payment_method: "card".to_string(),
        shipping_address: ShippingAddress {
            recipient: "Ada Buyer".to_string(),
            line1: "1 Market Street".to_string(),
            city: "Leeds".to_string(),
            postal_code: "LS1 1AA".to_string(),
            country: "GB".to_string(),
            ..ShippingAddress::default()
        },
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

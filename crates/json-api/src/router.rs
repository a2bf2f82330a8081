//! App Router

use salvo::Router;

use crate::{carts, checkout, coupons, identity, orders, products};

/// Routes that act on behalf of a buyer sit behind the identity middleware.
pub(crate) fn app_router() -> Router {
    Router::new()
        .push(Router::with_path("products/{product}/stock").get(products::stock::handler))
        .push(Router::with_path("coupons/quote").post(coupons::quote::handler))
        .push(
            Router::new()
                .hoop(identity::handler)
                .push(
                    Router::with_path("cart")
                        .get(carts::get::handler)
                        .delete(carts::clear::handler)
                        .push(
                            Router::with_path("lines")
                                .post(carts::add::handler)
                                .push(
                                    Router::with_path("{line}")
                                        .put(carts::update::handler)
                                        .delete(carts::remove::handler),
                                ),
                        ),
                )
                .push(
                    Router::with_path("checkout")
                        .post(checkout::create::handler)
                        .push(Router::with_path("all").post(checkout::all::handler)),
                )
                .push(
                    Router::with_path("shops/{shop}/checkout").post(checkout::cart::handler),
                )
                .push(
                    Router::with_path("orders")
                        .get(orders::index::handler)
                        .push(
                            Router::with_path("{order}")
                                .get(orders::get::handler)
                                .push(Router::with_path("cancel").post(orders::cancel::handler)),
                        ),
                ),
        )
}

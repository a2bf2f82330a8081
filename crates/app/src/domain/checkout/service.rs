//! Checkout service.

use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use sqlx::{Postgres, Transaction};
use tracing::{Span, field, info, warn};

use crate::{
    database::Db,
    domain::{
        carts::{repository::PgCartsRepository, variation::Variation},
        checkout::{
            errors::CheckoutError,
            models::{CheckoutDetails, CheckoutLine, CheckoutRequest, PlacedOrder, ShopCheckout},
        },
        coupons::{
            errors::CouponError, models::normalize_code, repository::PgCouponsRepository,
            validator::validate,
        },
        notifications::{CheckoutNotifier, OrderPlaced, dispatch},
        orders::{
            factory::{AppliedDiscount, OrderFactory, PricedLine, subtotal},
            models::Order,
            numbers::{OrderNumberGenerator, RandomOrderNumbers},
            repository::PgOrdersRepository,
        },
        parties::{BuyerUuid, ShopUuid},
        products::{models::ProductUuid, repository::PgProductsRepository},
        stock::{ledger::PgStockLedger, models::Reservation},
    },
};

/// Limits applied to every checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// Upper bound on the placement, from first query up to the commit.
    pub timeout: Duration,

    /// Bound on any single statement or lock wait inside the transaction.
    pub statement_timeout: Duration,

    /// Order number candidates tried before giving up.
    pub order_number_attempts: u32,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            statement_timeout: Duration::from_secs(5),
            order_number_attempts: 3,
        }
    }
}

#[derive(Clone)]
pub struct PgCheckoutService {
    db: Db,
    settings: CheckoutSettings,
    numbers: Arc<dyn OrderNumberGenerator>,
    notifier: Arc<dyn CheckoutNotifier>,
    products: PgProductsRepository,
    ledger: PgStockLedger,
    coupons: PgCouponsRepository,
    orders: PgOrdersRepository,
    carts: PgCartsRepository,
}

impl fmt::Debug for PgCheckoutService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgCheckoutService")
            .field("settings", &self.settings)
            .field("numbers", &self.numbers)
            .finish_non_exhaustive()
    }
}

impl PgCheckoutService {
    #[must_use]
    pub fn new(db: Db, settings: CheckoutSettings, notifier: Arc<dyn CheckoutNotifier>) -> Self {
        Self {
            db,
            settings,
            numbers: Arc::new(RandomOrderNumbers),
            notifier,
            products: PgProductsRepository::new(),
            ledger: PgStockLedger::new(),
            coupons: PgCouponsRepository::new(),
            orders: PgOrdersRepository::new(),
            carts: PgCartsRepository::new(),
        }
    }

    /// Replace the order number source.
    #[must_use]
    pub fn with_order_numbers(mut self, numbers: Arc<dyn OrderNumberGenerator>) -> Self {
        self.numbers = numbers;
        self
    }

    /// Do every write of the placement in one bounded transaction and hand it
    /// back uncommitted.
    ///
    /// Returning early from anywhere in here drops the transaction, which
    /// rolls back every reservation and redemption made so far.
    async fn place(
        &self,
        request: &CheckoutRequest,
    ) -> Result<(Transaction<'static, Postgres>, Order), CheckoutError> {
        let mut tx = self
            .db
            .begin_bounded_transaction(self.settings.statement_timeout)
            .await?;

        // Per-product demand, iterated in ascending product order so that
        // overlapping checkouts always lock rows in the same sequence.
        let mut demand: BTreeMap<ProductUuid, u32> = BTreeMap::new();

        for line in &request.lines {
            let quantity = demand.entry(line.product_uuid).or_insert(0);

            *quantity = quantity
                .checked_add(line.quantity)
                .ok_or(CheckoutError::AmountOverflow)?;
        }

        let product_uuids: Vec<ProductUuid> = demand.keys().copied().collect();

        let shops: FxHashMap<ProductUuid, ShopUuid> = self
            .products
            .get_products(&mut tx, &product_uuids)
            .await?
            .into_iter()
            .map(|product| (product.uuid, product.shop_uuid))
            .collect();

        for product in &product_uuids {
            if shops.get(product) != Some(&request.shop_uuid) {
                return Err(CheckoutError::UnknownProduct(*product));
            }
        }

        let mut prices: FxHashMap<ProductUuid, u64> = FxHashMap::default();

        for (&product, &quantity) in &demand {
            match self.ledger.reserve(&mut tx, product, quantity).await? {
                Reservation::Reserved { unit_price } => {
                    prices.insert(product, unit_price);
                }
                Reservation::InsufficientStock => {
                    return Err(CheckoutError::InsufficientStock(product));
                }
            }
        }

        let priced = request
            .lines
            .iter()
            .map(|line| {
                let unit_price = prices
                    .get(&line.product_uuid)
                    .copied()
                    .ok_or(CheckoutError::UnknownProduct(line.product_uuid))?;

                Ok(PricedLine {
                    product_uuid: line.product_uuid,
                    quantity: line.quantity,
                    unit_price,
                    variation: line.variation.clone(),
                })
            })
            .collect::<Result<Vec<_>, CheckoutError>>()?;

        let discount = match coupon_code(&request.details) {
            Some(code) => {
                let subtotal = subtotal(&priced)?;
                let coupon = self.coupons.find_coupon_by_code(&mut tx, &code).await?;
                let discount = validate(coupon.as_ref(), subtotal, Timestamp::now())?;

                if !self
                    .coupons
                    .redeem_coupon(&mut tx, discount.coupon_uuid)
                    .await?
                {
                    return Err(CouponError::UsageExceeded.into());
                }

                Some(AppliedDiscount {
                    coupon_uuid: discount.coupon_uuid,
                    amount: discount.amount,
                })
            }
            None => None,
        };

        let draft = OrderFactory {
            buyer_uuid: request.buyer_uuid,
            shop_uuid: request.shop_uuid,
            payment_method: request.details.payment_method.clone(),
            shipping_address: request.details.shipping_address.clone(),
        }
        .build(priced, discount)?;

        let order = self
            .orders
            .create_order(
                &mut tx,
                &draft,
                self.numbers.as_ref(),
                self.settings.order_number_attempts,
            )
            .await?
            .ok_or(CheckoutError::OrderNumberGenerationFailed)?;

        self.orders
            .create_order_lines(&mut tx, order.uuid, &draft.lines)
            .await?;

        for (&product, &quantity) in &demand {
            self.ledger.record_sale(&mut tx, product, quantity).await?;
        }

        Ok((tx, order))
    }

    /// Commit a placed order.
    ///
    /// A commit error does not say whether the server applied it, so the
    /// order row is looked up before reporting failure.
    async fn commit(
        &self,
        tx: Transaction<'static, Postgres>,
        order: &Order,
    ) -> Result<(), CheckoutError> {
        let Err(error) = tx.commit().await else {
            return Ok(());
        };

        warn!(
            %error,
            order_uuid = %order.uuid,
            "commit failed, checking whether the order landed"
        );

        let mut check = self.db.begin_transaction().await?;
        let landed = self.orders.find_order(&mut check, order.uuid).await?;

        check.commit().await?;

        match landed {
            Some(_) => Ok(()),
            None => Err(error.into()),
        }
    }

    /// Take the purchased quantities off the buyer's cart lines. Failures are
    /// only logged.
    async fn clear_purchased(&self, buyer: BuyerUuid, lines: &[CheckoutLine]) {
        let mut purchased: BTreeMap<(ProductUuid, String), u32> = BTreeMap::new();

        for line in lines {
            let key = (line.product_uuid, Variation::key_for(line.variation.as_ref()));
            let quantity = purchased.entry(key).or_insert(0);

            *quantity = quantity.saturating_add(line.quantity);
        }

        let purchased: Vec<(ProductUuid, String, u32)> = purchased
            .into_iter()
            .map(|((product, key), quantity)| (product, key, quantity))
            .collect();

        let result = async {
            let mut tx = self.db.begin_transaction().await?;

            let removed = self
                .carts
                .remove_purchased_lines(&mut tx, buyer, &purchased)
                .await?;

            tx.commit().await?;

            Ok::<u64, sqlx::Error>(removed)
        }
        .await;

        if let Err(error) = result {
            warn!(%error, buyer_uuid = %buyer, "failed to clear purchased cart lines");
        }
    }

    async fn cart_lines_by_shop(
        &self,
        buyer: BuyerUuid,
    ) -> Result<Vec<(ShopUuid, Vec<CheckoutLine>)>, CheckoutError> {
        let mut tx = self.db.begin_transaction().await?;

        let views = self.carts.get_priced_lines(&mut tx, buyer).await?;

        tx.commit().await?;

        let mut by_shop: Vec<(ShopUuid, Vec<CheckoutLine>)> = Vec::new();

        for view in views {
            let line = CheckoutLine {
                product_uuid: view.line.product_uuid,
                quantity: view.line.quantity,
                variation: view.line.variation,
            };

            match by_shop.iter_mut().find(|(shop, _)| *shop == view.shop_uuid) {
                Some((_, lines)) => lines.push(line),
                None => by_shop.push((view.shop_uuid, vec![line])),
            }
        }

        Ok(by_shop)
    }
}

/// The coupon code to redeem, if one was given.
fn coupon_code(details: &CheckoutDetails) -> Option<String> {
    details
        .coupon_code
        .as_deref()
        .map(normalize_code)
        .filter(|code| !code.is_empty())
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    #[tracing::instrument(
        name = "checkout.service.checkout",
        skip(self, request),
        fields(
            buyer_uuid = %request.buyer_uuid,
            shop_uuid = %request.shop_uuid,
            lines = request.lines.len(),
            order_number = field::Empty,
        ),
        err
    )]
    async fn checkout(&self, request: CheckoutRequest) -> Result<PlacedOrder, CheckoutError> {
        if request.lines.is_empty() {
            return Err(CheckoutError::EmptyCheckout);
        }

        if request.lines.iter().any(|line| line.quantity == 0) {
            return Err(CheckoutError::InvalidQuantity);
        }

        let (tx, order) = tokio::time::timeout(self.settings.timeout, self.place(&request))
            .await
            .map_err(|_elapsed| CheckoutError::TimedOut)??;

        self.commit(tx, &order).await?;

        Span::current().record("order_number", field::display(&order.order_number));

        info!(
            order_uuid = %order.uuid,
            total = order.total,
            discount = order.discount,
            "order placed"
        );

        self.clear_purchased(request.buyer_uuid, &request.lines).await;

        dispatch(Arc::clone(&self.notifier), OrderPlaced::from(&order));

        Ok(PlacedOrder {
            order_uuid: order.uuid,
            order_number: order.order_number,
            total: order.total,
        })
    }

    #[tracing::instrument(name = "checkout.service.checkout_cart", skip(self, details), err)]
    async fn checkout_cart(
        &self,
        buyer: BuyerUuid,
        shop: ShopUuid,
        details: CheckoutDetails,
    ) -> Result<PlacedOrder, CheckoutError> {
        let lines = self
            .cart_lines_by_shop(buyer)
            .await?
            .into_iter()
            .find(|(shop_uuid, _)| *shop_uuid == shop)
            .map(|(_, lines)| lines)
            .ok_or(CheckoutError::EmptyCheckout)?;

        self.checkout(CheckoutRequest {
            buyer_uuid: buyer,
            shop_uuid: shop,
            lines,
            details,
        })
        .await
    }

    #[tracing::instrument(name = "checkout.service.checkout_all", skip(self, details), err)]
    async fn checkout_all(
        &self,
        buyer: BuyerUuid,
        details: CheckoutDetails,
    ) -> Result<Vec<ShopCheckout>, CheckoutError> {
        let by_shop = self.cart_lines_by_shop(buyer).await?;

        if by_shop.is_empty() {
            return Err(CheckoutError::EmptyCheckout);
        }

        let mut outcomes = Vec::with_capacity(by_shop.len());

        for (shop_uuid, lines) in by_shop {
            let outcome = self
                .checkout(CheckoutRequest {
                    buyer_uuid: buyer,
                    shop_uuid,
                    lines,
                    details: details.clone(),
                })
                .await;

            outcomes.push(ShopCheckout { shop_uuid, outcome });
        }

        Ok(outcomes)
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Place one order for explicit lines from a single shop.
    ///
    /// Either every line is reserved and the order is committed, or nothing
    /// changes. The buyer's matching cart lines are removed afterwards.
    async fn checkout(&self, request: CheckoutRequest) -> Result<PlacedOrder, CheckoutError>;

    /// Check out the buyer's cart lines belonging to `shop`.
    async fn checkout_cart(
        &self,
        buyer: BuyerUuid,
        shop: ShopUuid,
        details: CheckoutDetails,
    ) -> Result<PlacedOrder, CheckoutError>;

    /// Split the buyer's cart by shop and check out each part independently.
    ///
    /// One shop failing does not stop the others; each outcome is reported.
    async fn checkout_all(
        &self,
        buyer: BuyerUuid,
        details: CheckoutDetails,
    ) -> Result<Vec<ShopCheckout>, CheckoutError>;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sqlx::query_scalar;
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::{
                CartsService,
                models::{CartLineUuid, NewCartLine},
            },
            coupons::{CouponsService, models::DiscountKind},
            notifications::LogNotifier,
            orders::OrdersService,
            products::ProductsService,
            stock::StockService,
        },
        test::{
            TestContext,
            helpers::{ChannelNotifier, ScriptedOrderNumbers, checkout_details},
        },
    };

    use super::*;

    async fn order_count(ctx: &TestContext) -> i64 {
        query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(ctx.db.pool())
            .await
            .expect("Failed to count orders")
    }

    async fn add_to_cart(
        ctx: &TestContext,
        buyer: BuyerUuid,
        product: ProductUuid,
        quantity: u32,
        variation: Option<Variation>,
    ) {
        ctx.carts
            .add_line(
                buyer,
                NewCartLine {
                    uuid: CartLineUuid::new(),
                    product_uuid: product,
                    quantity,
                    variation,
                },
            )
            .await
            .expect("Failed to add cart line");
    }

    #[tokio::test]
    async fn cart_checkout_reserves_and_totals() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(12_00, 5).await;
        let buyer = BuyerUuid::new();

        add_to_cart(&ctx, buyer, product.uuid, 3, None).await;

        let placed = ctx
            .checkout
            .checkout_cart(buyer, ctx.shop_uuid, checkout_details(None))
            .await?;

        let level = ctx.stock.stock_level(product.uuid).await?;
        let cart = ctx.carts.get_cart(buyer).await?;

        assert_eq!(placed.total, 36_00);
        assert!(placed.order_number.as_str().starts_with("ORD-"));
        assert_eq!(level.stock, 2);
        assert_eq!(level.sales, 3);
        assert!(cart.is_empty());

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checkouts_never_oversell() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(1_00, 3).await;
        let checkout = Arc::new(ctx.checkout.clone());

        let attempts: Vec<_> = (0..10)
            .map(|_| {
                let checkout = Arc::clone(&checkout);
                let request = ctx.checkout_request(BuyerUuid::new(), &[(product.uuid, 1)]);

                tokio::spawn(async move { checkout.checkout(request).await })
            })
            .collect();

        let mut placed = 0;
        let mut rejected = 0;

        for attempt in attempts {
            match attempt.await? {
                Ok(_) => placed += 1,
                Err(CheckoutError::InsufficientStock(p)) if p == product.uuid => rejected += 1,
                Err(other) => panic!("unexpected checkout failure: {other:?}"),
            }
        }

        let level = ctx.stock.stock_level(product.uuid).await?;

        assert_eq!(placed, 3);
        assert_eq!(rejected, 7);
        assert_eq!(level.stock, 0);
        assert_eq!(level.sales, 3);
        assert_eq!(order_count(&ctx).await, 3);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn last_unit_goes_to_exactly_one_buyer() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(9_00, 1).await;

        let lines = [(product.uuid, 1)];
        let first = ctx.place_order(BuyerUuid::new(), &lines);
        let second = ctx.place_order(BuyerUuid::new(), &lines);

        let (first, second) = tokio::join!(first, second);

        let winners = [&first, &second].iter().filter(|r| r.is_ok()).count();
        let losers = [&first, &second]
            .iter()
            .filter(|r| matches!(r, Err(CheckoutError::InsufficientStock(_))))
            .count();

        assert_eq!(winners, 1);
        assert_eq!(losers, 1);
        assert_eq!(ctx.stock.stock_level(product.uuid).await?.stock, 0);

        Ok(())
    }

    #[tokio::test]
    async fn failing_line_leaves_no_trace() -> TestResult {
        let ctx = TestContext::new().await;
        let plenty = ctx.create_product(2_00, 5).await;
        let scarce = ctx.create_product(3_00, 1).await;

        let result = ctx
            .place_order(BuyerUuid::new(), &[(plenty.uuid, 2), (scarce.uuid, 2)])
            .await;

        let plenty_level = ctx.stock.stock_level(plenty.uuid).await?;
        let scarce_level = ctx.stock.stock_level(scarce.uuid).await?;

        assert!(
            matches!(result, Err(CheckoutError::InsufficientStock(p)) if p == scarce.uuid),
            "expected InsufficientStock, got {result:?}"
        );
        assert_eq!((plenty_level.stock, plenty_level.sales), (5, 0));
        assert_eq!((scarce_level.stock, scarce_level.sales), (1, 0));
        assert_eq!(order_count(&ctx).await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn order_lines_keep_the_price_paid() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(10_00, 5).await;
        let buyer = BuyerUuid::new();

        let placed = ctx.place_order(buyer, &[(product.uuid, 2)]).await?;
        ctx.products.update_price(product.uuid, 99_00).await?;

        let details = ctx.orders.get_order(buyer, placed.order_uuid).await?;

        assert_eq!(details.lines[0].unit_price, 10_00);
        assert_eq!(details.order.total, 20_00);

        Ok(())
    }

    #[tokio::test]
    async fn repeated_products_are_reserved_together() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(1_00, 5).await;
        let buyer = BuyerUuid::new();

        let mut request = ctx.checkout_request(buyer, &[(product.uuid, 2), (product.uuid, 3)]);
        request.lines[0].variation = Some(Variation::new().with("size", "M"));
        request.lines[1].variation = Some(Variation::new().with("size", "L"));

        let placed = ctx.checkout.checkout(request).await?;
        let details = ctx.orders.get_order(buyer, placed.order_uuid).await?;

        assert_eq!(details.lines.len(), 2);
        assert_eq!(
            details.lines[0].variation,
            Some(Variation::new().with("size", "M"))
        );
        assert_eq!(ctx.stock.stock_level(product.uuid).await?.stock, 0);

        Ok(())
    }

    #[tokio::test]
    async fn save10_below_minimum_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(40_00, 5).await;
        ctx.create_coupon("SAVE10", DiscountKind::Percentage, 10, 50_00, None).await;

        let mut request = ctx.checkout_request(BuyerUuid::new(), &[(product.uuid, 1)]);
        request.details = checkout_details(Some("SAVE10"));

        let result = ctx.checkout.checkout(request).await;

        assert!(matches!(
            result,
            Err(CheckoutError::Coupon(CouponError::BelowMinimum))
        ));
        assert_eq!(ctx.stock.stock_level(product.uuid).await?.stock, 5);

        Ok(())
    }

    #[tokio::test]
    async fn save10_discounts_a_qualifying_order() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(100_00, 5).await;
        let coupon = ctx
            .create_coupon("SAVE10", DiscountKind::Percentage, 10, 50_00, None)
            .await;
        let buyer = BuyerUuid::new();

        let mut request = ctx.checkout_request(buyer, &[(product.uuid, 1)]);
        request.details = checkout_details(Some("save10"));

        let placed = ctx.checkout.checkout(request).await?;
        let details = ctx.orders.get_order(buyer, placed.order_uuid).await?;

        assert_eq!(placed.total, 90_00);
        assert_eq!(details.order.subtotal, 100_00);
        assert_eq!(details.order.discount, 10_00);
        assert_eq!(details.order.coupon_uuid, Some(coupon.uuid));
        assert_eq!(ctx.coupons.get_coupon(coupon.uuid).await?.used_count, 1);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn single_use_coupon_is_redeemed_once() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(20_00, 10).await;
        let coupon = ctx
            .create_coupon("ONCE", DiscountKind::Fixed, 5_00, 0, Some(1))
            .await;

        let requests: Vec<CheckoutRequest> = (0..2)
            .map(|_| {
                let mut request = ctx.checkout_request(BuyerUuid::new(), &[(product.uuid, 1)]);
                request.details = checkout_details(Some("ONCE"));
                request
            })
            .collect();

        let checkout = Arc::new(ctx.checkout.clone());

        let attempts: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let checkout = Arc::clone(&checkout);

                tokio::spawn(async move { checkout.checkout(request).await })
            })
            .collect();

        let mut placed = 0;
        let mut exhausted = 0;

        for attempt in attempts {
            match attempt.await? {
                Ok(order) => {
                    assert_eq!(order.total, 15_00);
                    placed += 1;
                }
                Err(CheckoutError::Coupon(CouponError::UsageExceeded)) => exhausted += 1,
                Err(other) => panic!("unexpected checkout failure: {other:?}"),
            }
        }

        assert_eq!((placed, exhausted), (1, 1));
        assert_eq!(ctx.coupons.get_coupon(coupon.uuid).await?.used_count, 1);
        assert_eq!(ctx.stock.stock_level(product.uuid).await?.stock, 9);

        Ok(())
    }

    #[tokio::test]
    async fn colliding_order_number_is_regenerated() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(1_00, 5).await;
        let checkout = ctx
            .checkout_with(CheckoutSettings::default(), Arc::new(LogNotifier))
            .with_order_numbers(Arc::new(ScriptedOrderNumbers::new(&[
                "ORD-A", "ORD-A", "ORD-B",
            ])));

        let first = checkout
            .checkout(ctx.checkout_request(BuyerUuid::new(), &[(product.uuid, 1)]))
            .await?;
        let second = checkout
            .checkout(ctx.checkout_request(BuyerUuid::new(), &[(product.uuid, 1)]))
            .await?;

        assert_eq!(first.order_number.as_str(), "ORD-A");
        assert_eq!(second.order_number.as_str(), "ORD-B");
        assert_eq!(ctx.stock.stock_level(product.uuid).await?.stock, 3);

        Ok(())
    }

    #[tokio::test]
    async fn exhausted_order_numbers_roll_back() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(1_00, 5).await;
        let checkout = ctx
            .checkout_with(CheckoutSettings::default(), Arc::new(LogNotifier))
            .with_order_numbers(Arc::new(ScriptedOrderNumbers::new(&["ORD-SAME"])));

        checkout
            .checkout(ctx.checkout_request(BuyerUuid::new(), &[(product.uuid, 1)]))
            .await?;

        let result = checkout
            .checkout(ctx.checkout_request(BuyerUuid::new(), &[(product.uuid, 2)]))
            .await;

        let level = ctx.stock.stock_level(product.uuid).await?;

        assert!(matches!(
            result,
            Err(CheckoutError::OrderNumberGenerationFailed)
        ));
        assert_eq!((level.stock, level.sales), (4, 1));
        assert_eq!(order_count(&ctx).await, 1);

        Ok(())
    }

    #[tokio::test]
    async fn products_from_another_shop_are_unknown() -> TestResult {
        let ctx = TestContext::new().await;
        let foreign = ctx.create_shop_product(ShopUuid::new(), 1_00, 5).await;
        let missing = ProductUuid::new();

        let foreign_result = ctx
            .place_order(BuyerUuid::new(), &[(foreign.uuid, 1)])
            .await;
        let missing_result = ctx.place_order(BuyerUuid::new(), &[(missing, 1)]).await;

        assert!(matches!(
            foreign_result,
            Err(CheckoutError::UnknownProduct(p)) if p == foreign.uuid
        ));
        assert!(matches!(
            missing_result,
            Err(CheckoutError::UnknownProduct(p)) if p == missing
        ));
        assert_eq!(ctx.stock.stock_level(foreign.uuid).await?.stock, 5);

        Ok(())
    }

    #[tokio::test]
    async fn empty_and_zero_quantity_checkouts_are_rejected() {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(1_00, 5).await;

        let empty = ctx.place_order(BuyerUuid::new(), &[]).await;
        let zero = ctx.place_order(BuyerUuid::new(), &[(product.uuid, 0)]).await;
        let empty_cart = ctx
            .checkout
            .checkout_cart(BuyerUuid::new(), ctx.shop_uuid, checkout_details(None))
            .await;

        assert!(matches!(empty, Err(CheckoutError::EmptyCheckout)));
        assert!(matches!(zero, Err(CheckoutError::InvalidQuantity)));
        assert!(matches!(empty_cart, Err(CheckoutError::EmptyCheckout)));
    }

    #[tokio::test]
    async fn failed_checkout_leaves_the_cart_alone() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(1_00, 1).await;
        let buyer = BuyerUuid::new();

        add_to_cart(&ctx, buyer, product.uuid, 2, None).await;

        let result = ctx
            .checkout
            .checkout_cart(buyer, ctx.shop_uuid, checkout_details(None))
            .await;

        assert!(matches!(result, Err(CheckoutError::InsufficientStock(_))));
        assert_eq!(ctx.carts.get_cart(buyer).await?.total_items, 2);

        Ok(())
    }

    #[tokio::test]
    async fn explicit_checkout_removes_only_matching_cart_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let shirt = ctx.create_product(10_00, 5).await;
        let socks = ctx.create_product(2_00, 5).await;
        let buyer = BuyerUuid::new();
        let medium = Variation::new().with("size", "M");
        let large = Variation::new().with("size", "L");

        add_to_cart(&ctx, buyer, shirt.uuid, 1, Some(medium.clone())).await;
        add_to_cart(&ctx, buyer, shirt.uuid, 1, Some(large.clone())).await;
        add_to_cart(&ctx, buyer, socks.uuid, 3, None).await;

        let mut request = ctx.checkout_request(buyer, &[(shirt.uuid, 1)]);
        request.lines[0].variation = Some(medium);

        ctx.checkout.checkout(request).await?;

        let remaining: Vec<(ProductUuid, Option<Variation>)> = ctx
            .carts
            .get_cart(buyer)
            .await?
            .lines
            .into_iter()
            .map(|view| (view.line.product_uuid, view.line.variation))
            .collect();

        assert_eq!(
            remaining,
            vec![(shirt.uuid, Some(large)), (socks.uuid, None)]
        );

        Ok(())
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_checkout() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(4_00, 5).await;
        let (notifier, mut events) = ChannelNotifier::new(true);
        let checkout = ctx.checkout_with(CheckoutSettings::default(), Arc::new(notifier));

        let placed = checkout
            .checkout(ctx.checkout_request(BuyerUuid::new(), &[(product.uuid, 2)]))
            .await?;

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await?
            .expect("notifier never called");

        assert_eq!(event.order_uuid, placed.order_uuid);
        assert_eq!(event.order_number, placed.order_number);
        assert_eq!(event.total, 8_00);

        Ok(())
    }

    #[tokio::test]
    async fn checkout_all_places_one_order_per_shop() -> TestResult {
        let ctx = TestContext::new().await;
        let other_shop = ShopUuid::new();
        let local = ctx.create_product(5_00, 5).await;
        let remote = ctx.create_shop_product(other_shop, 7_00, 5).await;
        let buyer = BuyerUuid::new();

        add_to_cart(&ctx, buyer, local.uuid, 1, None).await;
        add_to_cart(&ctx, buyer, remote.uuid, 2, None).await;

        let outcomes = ctx
            .checkout
            .checkout_all(buyer, checkout_details(None))
            .await?;

        let totals: Vec<(ShopUuid, Option<u64>)> = outcomes
            .iter()
            .map(|shop| {
                (
                    shop.shop_uuid,
                    shop.outcome.as_ref().ok().map(|order| order.total),
                )
            })
            .collect();

        assert_eq!(
            totals,
            vec![(ctx.shop_uuid, Some(5_00)), (other_shop, Some(14_00))]
        );
        assert!(ctx.carts.get_cart(buyer).await?.is_empty());
        assert_eq!(ctx.orders.list_orders(buyer, 10, 0).await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn checkout_all_reports_each_shop_independently() -> TestResult {
        let ctx = TestContext::new().await;
        let other_shop = ShopUuid::new();
        let local = ctx.create_product(5_00, 5).await;
        let remote = ctx.create_shop_product(other_shop, 7_00, 1).await;
        let buyer = BuyerUuid::new();

        add_to_cart(&ctx, buyer, local.uuid, 1, None).await;
        add_to_cart(&ctx, buyer, remote.uuid, 2, None).await;

        let outcomes = ctx
            .checkout
            .checkout_all(buyer, checkout_details(None))
            .await?;

        let cart = ctx.carts.get_cart(buyer).await?;

        assert!(outcomes[0].outcome.is_ok());
        assert!(matches!(
            outcomes[1].outcome,
            Err(CheckoutError::InsufficientStock(p)) if p == remote.uuid
        ));
        assert_eq!(cart.shops(), vec![other_shop]);

        Ok(())
    }

    #[tokio::test]
    async fn slow_placement_times_out_and_rolls_back() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(1_00, 5).await;

        let mut blocker = ctx.db.pool().begin().await?;
        sqlx::query("SELECT stock FROM products WHERE uuid = $1 FOR UPDATE")
            .bind(product.uuid.into_uuid())
            .execute(&mut *blocker)
            .await?;

        let checkout = ctx.checkout_with(
            CheckoutSettings {
                timeout: Duration::from_millis(300),
                statement_timeout: Duration::from_secs(5),
                order_number_attempts: 3,
            },
            Arc::new(LogNotifier),
        );

        let result = checkout
            .checkout(ctx.checkout_request(BuyerUuid::new(), &[(product.uuid, 1)]))
            .await;

        blocker.rollback().await?;

        assert!(matches!(result, Err(CheckoutError::TimedOut)));
        assert_eq!(ctx.stock.stock_level(product.uuid).await?.stock, 5);
        assert_eq!(order_count(&ctx).await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn lock_wait_beyond_statement_timeout_times_out() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(1_00, 5).await;

        let mut blocker = ctx.db.pool().begin().await?;
        sqlx::query("SELECT stock FROM products WHERE uuid = $1 FOR UPDATE")
            .bind(product.uuid.into_uuid())
            .execute(&mut *blocker)
            .await?;

        let checkout = ctx.checkout_with(
            CheckoutSettings {
                timeout: Duration::from_secs(10),
                statement_timeout: Duration::from_millis(200),
                order_number_attempts: 3,
            },
            Arc::new(LogNotifier),
        );

        let result = checkout
            .checkout(ctx.checkout_request(BuyerUuid::new(), &[(product.uuid, 1)]))
            .await;

        blocker.rollback().await?;

        assert!(
            matches!(result, Err(CheckoutError::TimedOut)),
            "expected TimedOut, got {result:?}"
        );
        assert_eq!(ctx.stock.stock_level(product.uuid).await?.stock, 5);

        Ok(())
    }

    #[tokio::test]
    async fn explicit_checkout_takes_only_purchased_units_off_the_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(3_00, 10).await;
        let buyer = BuyerUuid::new();

        add_to_cart(&ctx, buyer, product.uuid, 3, None).await;

        ctx.checkout
            .checkout(ctx.checkout_request(buyer, &[(product.uuid, 1)]))
            .await?;

        let cart = ctx.carts.get_cart(buyer).await?;

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.total_items, 2);

        ctx.checkout
            .checkout(ctx.checkout_request(buyer, &[(product.uuid, 1), (product.uuid, 2)]))
            .await?;

        assert!(ctx.carts.get_cart(buyer).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn slow_commit_is_not_cut_off_by_the_placement_deadline() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(2_00, 5).await;
        let buyer = BuyerUuid::new();

        sqlx::query(
            "CREATE FUNCTION slow_commit() RETURNS trigger LANGUAGE plpgsql AS $$ \
             BEGIN PERFORM pg_sleep(1); RETURN NULL; END $$",
        )
        .execute(ctx.db.pool())
        .await?;
        sqlx::query(
            "CREATE CONSTRAINT TRIGGER orders_slow_commit AFTER INSERT ON orders \
             DEFERRABLE INITIALLY DEFERRED FOR EACH ROW EXECUTE FUNCTION slow_commit()",
        )
        .execute(ctx.db.pool())
        .await?;

        add_to_cart(&ctx, buyer, product.uuid, 2, None).await;

        let checkout = ctx.checkout_with(
            CheckoutSettings {
                timeout: Duration::from_millis(500),
                statement_timeout: Duration::from_secs(5),
                order_number_attempts: 3,
            },
            Arc::new(LogNotifier),
        );

        let placed = checkout
            .checkout_cart(buyer, ctx.shop_uuid, checkout_details(None))
            .await?;

        assert_eq!(placed.total, 4_00);
        assert_eq!(order_count(&ctx).await, 1);
        assert_eq!(ctx.stock.stock_level(product.uuid).await?.stock, 3);
        assert!(ctx.carts.get_cart(buyer).await?.is_empty());

        Ok(())
    }
}

//! Orders service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::{
    database::Db,
    domain::{
        orders::{
            errors::OrdersServiceError,
            models::{Order, OrderDetails, OrderStatus, OrderUuid},
            repository::PgOrdersRepository,
        },
        parties::BuyerUuid,
        stock::ledger::PgStockLedger,
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    repository: PgOrdersRepository,
    ledger: PgStockLedger,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgOrdersRepository::new(),
            ledger: PgStockLedger::new(),
        }
    }

    /// Apply a status change to a locked order, restocking on cancellation.
    async fn transition(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: Order,
        next: OrderStatus,
    ) -> Result<Order, OrdersServiceError> {
        if !order.status.can_transition_to(next) {
            return Err(OrdersServiceError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        if next == OrderStatus::Cancelled {
            let mut lines = self.repository.get_order_lines(tx, order.uuid).await?;

            lines.sort_by_key(|line| line.product_uuid);

            for line in &lines {
                self.ledger.release(tx, line.product_uuid, line.quantity).await?;
            }
        }

        let updated = self
            .repository
            .update_order_status(tx, order.uuid, order.status, next)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        info!(
            order_uuid = %updated.uuid,
            order_number = %updated.order_number,
            from = %order.status,
            to = %next,
            "order status changed"
        );

        Ok(updated)
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn get_order(
        &self,
        buyer: BuyerUuid,
        order: OrderUuid,
    ) -> Result<OrderDetails, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.repository.get_buyer_order(&mut tx, buyer, order).await?;
        let lines = self.repository.get_order_lines(&mut tx, order.uuid).await?;

        tx.commit().await?;

        Ok(OrderDetails { order, lines })
    }

    async fn list_orders(
        &self,
        buyer: BuyerUuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let orders = self
            .repository
            .list_buyer_orders(&mut tx, buyer, limit, offset)
            .await?;

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(name = "orders.service.cancel_order", skip(self), err)]
    async fn cancel_order(
        &self,
        buyer: BuyerUuid,
        order: OrderUuid,
    ) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.repository.lock_order(&mut tx, order).await?;

        if order.buyer_uuid != buyer {
            return Err(OrdersServiceError::NotFound);
        }

        let cancelled = self
            .transition(&mut tx, order, OrderStatus::Cancelled)
            .await?;

        tx.commit().await?;

        Ok(cancelled)
    }

    #[tracing::instrument(name = "orders.service.advance_status", skip(self), err)]
    async fn advance_status(
        &self,
        order: OrderUuid,
        next: OrderStatus,
    ) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.repository.lock_order(&mut tx, order).await?;
        let updated = self.transition(&mut tx, order, next).await?;

        tx.commit().await?;

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Retrieve one of the buyer's orders with its lines.
    async fn get_order(
        &self,
        buyer: BuyerUuid,
        order: OrderUuid,
    ) -> Result<OrderDetails, OrdersServiceError>;

    /// The buyer's orders, newest first.
    async fn list_orders(
        &self,
        buyer: BuyerUuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Order>, OrdersServiceError>;

    /// Cancel a pending or processing order and return its units to stock.
    ///
    /// Lifetime sales counters are left as they are.
    async fn cancel_order(
        &self,
        buyer: BuyerUuid,
        order: OrderUuid,
    ) -> Result<Order, OrdersServiceError>;

    /// Move an order to its next fulfilment status.
    async fn advance_status(
        &self,
        order: OrderUuid,
        next: OrderStatus,
    ) -> Result<Order, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{domain::stock::StockService, test::TestContext};

    use super::*;

    #[tokio::test]
    async fn get_order_returns_lines_in_checkout_order() -> TestResult {
        let ctx = TestContext::new().await;
        let first = ctx.create_product(3_00, 5).await;
        let second = ctx.create_product(7_00, 5).await;
        let buyer = BuyerUuid::new();

        let placed = ctx
            .place_order(buyer, &[(second.uuid, 1), (first.uuid, 2)])
            .await?;

        let details = ctx.orders.get_order(buyer, placed.order_uuid).await?;

        let lines: Vec<_> = details
            .lines
            .iter()
            .map(|line| (line.product_uuid, line.quantity, line.unit_price))
            .collect();

        assert_eq!(details.order.order_number, placed.order_number);
        assert_eq!(details.order.status, OrderStatus::Pending);
        assert_eq!(details.order.total, 13_00);
        assert_eq!(
            lines,
            vec![(second.uuid, 1, 7_00), (first.uuid, 2, 3_00)]
        );

        Ok(())
    }

    #[tokio::test]
    async fn other_buyers_cannot_see_the_order() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(3_00, 5).await;
        let placed = ctx
            .place_order(BuyerUuid::new(), &[(product.uuid, 1)])
            .await?;

        let result = ctx.orders.get_order(BuyerUuid::new(), placed.order_uuid).await;

        assert!(matches!(result, Err(OrdersServiceError::NotFound)));

        Ok(())
    }

    #[tokio::test]
    async fn list_orders_is_newest_first_and_buyer_scoped() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(3_00, 10).await;
        let buyer = BuyerUuid::new();

        let older = ctx.place_order(buyer, &[(product.uuid, 1)]).await?;
        let newer = ctx.place_order(buyer, &[(product.uuid, 1)]).await?;
        ctx.place_order(BuyerUuid::new(), &[(product.uuid, 1)]).await?;

        let orders = ctx.orders.list_orders(buyer, 10, 0).await?;
        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        assert_eq!(uuids, vec![newer.order_uuid, older.order_uuid]);

        let page = ctx.orders.list_orders(buyer, 1, 1).await?;

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].uuid, older.order_uuid);

        Ok(())
    }

    #[tokio::test]
    async fn cancel_releases_stock_but_keeps_sales() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(3_00, 5).await;
        let buyer = BuyerUuid::new();
        let placed = ctx.place_order(buyer, &[(product.uuid, 2)]).await?;

        let cancelled = ctx.orders.cancel_order(buyer, placed.order_uuid).await?;
        let level = ctx.stock.stock_level(product.uuid).await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(level.stock, 5);
        assert_eq!(level.sales, 2);

        Ok(())
    }

    #[tokio::test]
    async fn cancel_twice_is_an_invalid_transition() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(3_00, 5).await;
        let buyer = BuyerUuid::new();
        let placed = ctx.place_order(buyer, &[(product.uuid, 2)]).await?;

        ctx.orders.cancel_order(buyer, placed.order_uuid).await?;
        let result = ctx.orders.cancel_order(buyer, placed.order_uuid).await;

        assert!(matches!(
            result,
            Err(OrdersServiceError::InvalidTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Cancelled,
            })
        ));
        assert_eq!(ctx.stock.stock_level(product.uuid).await?.stock, 5);

        Ok(())
    }

    #[tokio::test]
    async fn shipped_orders_cannot_be_cancelled() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(3_00, 5).await;
        let buyer = BuyerUuid::new();
        let placed = ctx.place_order(buyer, &[(product.uuid, 1)]).await?;

        ctx.orders
            .advance_status(placed.order_uuid, OrderStatus::Processing)
            .await?;
        ctx.orders
            .advance_status(placed.order_uuid, OrderStatus::Shipped)
            .await?;

        let result = ctx.orders.cancel_order(buyer, placed.order_uuid).await;

        assert!(matches!(
            result,
            Err(OrdersServiceError::InvalidTransition {
                from: OrderStatus::Shipped,
                ..
            })
        ));
        assert_eq!(ctx.stock.stock_level(product.uuid).await?.stock, 4);

        Ok(())
    }

    #[tokio::test]
    async fn another_buyer_cannot_cancel() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(3_00, 5).await;
        let placed = ctx
            .place_order(BuyerUuid::new(), &[(product.uuid, 1)])
            .await?;

        let result = ctx
            .orders
            .cancel_order(BuyerUuid::new(), placed.order_uuid)
            .await;

        assert!(matches!(result, Err(OrdersServiceError::NotFound)));

        Ok(())
    }

    #[tokio::test]
    async fn advance_status_rejects_skipping() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(3_00, 5).await;
        let placed = ctx
            .place_order(BuyerUuid::new(), &[(product.uuid, 1)])
            .await?;

        let result = ctx
            .orders
            .advance_status(placed.order_uuid, OrderStatus::Delivered)
            .await;

        assert!(matches!(
            result,
            Err(OrdersServiceError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Delivered,
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn advance_unknown_order_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx
            .orders
            .advance_status(OrderUuid::new(), OrderStatus::Processing)
            .await;

        assert!(matches!(result, Err(OrdersServiceError::NotFound)));
    }
}

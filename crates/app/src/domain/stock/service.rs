//! Stock service.
//!
//! Standalone ledger operations, each in its own transaction. Checkout does
//! not go through this service: it drives the ledger inside the order's
//! transaction instead.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        products::models::ProductUuid,
        stock::{
            errors::StockError,
            ledger::PgStockLedger,
            models::{Reservation, StockLevel},
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgStockService {
    db: Db,
    ledger: PgStockLedger,
}

impl PgStockService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            ledger: PgStockLedger::new(),
        }
    }
}

#[async_trait]
impl StockService for PgStockService {
    #[tracing::instrument(name = "stock.service.reserve", skip(self), err)]
    async fn reserve(
        &self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Reservation, StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity);
        }

        let mut tx = self.db.begin_transaction().await?;

        let reservation = self.ledger.reserve(&mut tx, product, quantity).await?;

        tx.commit().await?;

        Ok(reservation)
    }

    #[tracing::instrument(name = "stock.service.release", skip(self), err)]
    async fn release(&self, product: ProductUuid, quantity: u32) -> Result<(), StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity);
        }

        let mut tx = self.db.begin_transaction().await?;

        self.ledger.release(&mut tx, product, quantity).await?;

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(name = "stock.service.record_sale", skip(self), err)]
    async fn record_sale(&self, product: ProductUuid, quantity: u32) -> Result<(), StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity);
        }

        let mut tx = self.db.begin_transaction().await?;

        self.ledger.record_sale(&mut tx, product, quantity).await?;

        tx.commit().await?;

        Ok(())
    }

    async fn stock_level(&self, product: ProductUuid) -> Result<StockLevel, StockError> {
        let mut tx = self.db.begin_transaction().await?;

        let level = self.ledger.stock_level(&mut tx, product).await?;

        tx.commit().await?;

        Ok(level)
    }
}

#[automock]
#[async_trait]
pub trait StockService: Send + Sync {
    /// Atomically take `quantity` units if they are available.
    async fn reserve(&self, product: ProductUuid, quantity: u32)
    -> Result<Reservation, StockError>;

    /// Return `quantity` units to available stock.
    async fn release(&self, product: ProductUuid, quantity: u32) -> Result<(), StockError>;

    /// Count `quantity` units as sold.
    async fn record_sale(&self, product: ProductUuid, quantity: u32) -> Result<(), StockError>;

    /// Read the current stock and sales counters.
    async fn stock_level(&self, product: ProductUuid) -> Result<StockLevel, StockError>;
}

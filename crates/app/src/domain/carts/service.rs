//! Carts service.

use async_trait::async_trait;
use mockall::automock;
use tracing::debug;

use crate::{
    database::Db,
    domain::{
        carts::{
            errors::CartsServiceError,
            models::{CartLine, CartLineUuid, CartSnapshot, NewCartLine},
            repository::PgCartsRepository,
        },
        parties::BuyerUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    repository: PgCartsRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCartsRepository::new(),
        }
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    #[tracing::instrument(name = "carts.service.add_line", skip(self, line), fields(product_uuid = %line.product_uuid, quantity = line.quantity), err)]
    async fn add_line(
        &self,
        buyer: BuyerUuid,
        line: NewCartLine,
    ) -> Result<CartLine, CartsServiceError> {
        if line.quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut tx = self.db.begin_transaction().await?;

        let line = self.repository.add_or_merge_line(&mut tx, buyer, &line).await?;

        tx.commit().await?;

        Ok(line)
    }

    #[tracing::instrument(name = "carts.service.set_quantity", skip(self), err)]
    async fn set_quantity(
        &self,
        buyer: BuyerUuid,
        line: CartLineUuid,
        quantity: u32,
    ) -> Result<Option<CartLine>, CartsServiceError> {
        if quantity == 0 {
            self.remove_line(buyer, line).await?;

            return Ok(None);
        }

        let mut tx = self.db.begin_transaction().await?;

        let updated = self
            .repository
            .set_line_quantity(&mut tx, buyer, line, quantity)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        tx.commit().await?;

        Ok(Some(updated))
    }

    #[tracing::instrument(name = "carts.service.remove_line", skip(self), err)]
    async fn remove_line(
        &self,
        buyer: BuyerUuid,
        line: CartLineUuid,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rows_affected = self.repository.remove_line(&mut tx, buyer, line).await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(name = "carts.service.clear_cart", skip(self), err)]
    async fn clear_cart(&self, buyer: BuyerUuid) -> Result<u64, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let removed = self.repository.clear_cart(&mut tx, buyer).await?;

        tx.commit().await?;

        debug!(removed, "cart cleared");

        Ok(removed)
    }

    async fn get_cart(&self, buyer: BuyerUuid) -> Result<CartSnapshot, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let lines = self.repository.get_priced_lines(&mut tx, buyer).await?;

        tx.commit().await?;

        let mut total_items: u64 = 0;
        let mut total_amount: u64 = 0;

        for view in &lines {
            total_items = total_items
                .checked_add(u64::from(view.line.quantity))
                .ok_or(CartsServiceError::InvalidData)?;

            total_amount = total_amount
                .checked_add(view.subtotal)
                .ok_or(CartsServiceError::InvalidData)?;
        }

        Ok(CartSnapshot {
            buyer_uuid: buyer,
            lines,
            total_items,
            total_amount,
        })
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Add a line, merging quantities into an existing line for the same
    /// product and variation.
    async fn add_line(&self, buyer: BuyerUuid, line: NewCartLine)
    -> Result<CartLine, CartsServiceError>;

    /// Replace a line's quantity. Zero removes the line and returns `None`.
    async fn set_quantity(
        &self,
        buyer: BuyerUuid,
        line: CartLineUuid,
        quantity: u32,
    ) -> Result<Option<CartLine>, CartsServiceError>;

    /// Remove a single line owned by the buyer.
    async fn remove_line(&self, buyer: BuyerUuid, line: CartLineUuid)
    -> Result<(), CartsServiceError>;

    /// Remove every line and return how many were removed.
    async fn clear_cart(&self, buyer: BuyerUuid) -> Result<u64, CartsServiceError>;

    /// The buyer's cart priced at current catalog prices.
    async fn get_cart(&self, buyer: BuyerUuid) -> Result<CartSnapshot, CartsServiceError>;
}

//! Stock Ledger

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use tracing::debug;

use crate::domain::{
    amounts::try_get_amount,
    products::models::ProductUuid,
    stock::{
        errors::StockError,
        models::{Reservation, StockLevel},
    },
};

const RESERVE_STOCK_SQL: &str = include_str!("sql/reserve_stock.sql");
const RELEASE_STOCK_SQL: &str = include_str!("sql/release_stock.sql");
const RECORD_SALE_SQL: &str = include_str!("sql/record_sale.sql");
const GET_STOCK_LEVEL_SQL: &str = include_str!("sql/get_stock_level.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgStockLedger;

impl PgStockLedger {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Decrement stock by `quantity` only if at least that much is available.
    ///
    /// The availability check and the decrement are the same statement; a
    /// concurrent reservation on the same row waits for the row lock and then
    /// re-evaluates `stock >= quantity` against the committed value.
    pub(crate) async fn reserve(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Reservation, StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity);
        }

        let unit_price: Option<i64> = query_scalar(RESERVE_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(i64::from(quantity))
            .fetch_optional(&mut **tx)
            .await?;

        let Some(unit_price) = unit_price else {
            debug!(product_uuid = %product, quantity, "stock reservation rejected");

            return Ok(Reservation::InsufficientStock);
        };

        let unit_price = u64::try_from(unit_price).map_err(|_negative| StockError::OutOfRange)?;

        Ok(Reservation::Reserved { unit_price })
    }

    /// Compensating increment for a reservation that will not be fulfilled.
    pub(crate) async fn release(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), StockError> {
        self.increment(tx, RELEASE_STOCK_SQL, product, quantity).await
    }

    /// Add `quantity` to the product's lifetime sales counter.
    pub(crate) async fn record_sale(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), StockError> {
        self.increment(tx, RECORD_SALE_SQL, product, quantity).await
    }

    pub(crate) async fn stock_level(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<StockLevel, StockError> {
        query_as::<Postgres, StockLevel>(GET_STOCK_LEVEL_SQL)
            .bind(product.into_uuid())
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(StockError::NotFound(product))
    }

    async fn increment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sql: &'static str,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity);
        }

        let rows_affected = query(sql)
            .bind(product.into_uuid())
            .bind(i64::from(quantity))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(StockError::NotFound(product));
        }

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for StockLevel {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            product: ProductUuid::from_uuid(row.try_get("uuid")?),
            stock: try_get_amount(row, "stock")?,
            sales: try_get_amount(row, "sales")?,
        })
    }
}

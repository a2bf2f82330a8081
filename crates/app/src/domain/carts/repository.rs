//! Carts Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json};

use crate::domain::{
    amounts::{line_amount, try_get_amount, try_get_quantity},
    carts::{
        models::{CartLine, CartLineUuid, CartLineView, NewCartLine},
        variation::Variation,
    },
    parties::{BuyerUuid, ShopUuid},
    products::models::ProductUuid,
};

const ADD_OR_MERGE_LINE_SQL: &str = include_str!("sql/add_or_merge_line.sql");
const SET_LINE_QUANTITY_SQL: &str = include_str!("sql/set_line_quantity.sql");
const REMOVE_LINE_SQL: &str = include_str!("sql/remove_line.sql");
const CLEAR_CART_SQL: &str = include_str!("sql/clear_cart.sql");
const GET_PRICED_LINES_SQL: &str = include_str!("sql/get_priced_lines.sql");
const REMOVE_PURCHASED_LINES_SQL: &str = include_str!("sql/remove_purchased_lines.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository;

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert a line, or add its quantity onto the existing line for the same
    /// product and variation.
    pub(crate) async fn add_or_merge_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: BuyerUuid,
        line: &NewCartLine,
    ) -> Result<CartLine, sqlx::Error> {
        let variation = Variation::normalize(line.variation.clone());
        let variation_key = Variation::key_for(variation.as_ref());

        query_as::<Postgres, CartLine>(ADD_OR_MERGE_LINE_SQL)
            .bind(line.uuid.into_uuid())
            .bind(buyer.into_uuid())
            .bind(line.product_uuid.into_uuid())
            .bind(variation.map(Json))
            .bind(variation_key)
            .bind(i64::from(line.quantity))
            .fetch_one(&mut **tx)
            .await
    }

    /// Returns `None` when the line does not exist for this buyer.
    pub(crate) async fn set_line_quantity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: BuyerUuid,
        line: CartLineUuid,
        quantity: u32,
    ) -> Result<Option<CartLine>, sqlx::Error> {
        query_as::<Postgres, CartLine>(SET_LINE_QUANTITY_SQL)
            .bind(line.into_uuid())
            .bind(buyer.into_uuid())
            .bind(i64::from(quantity))
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn remove_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: BuyerUuid,
        line: CartLineUuid,
    ) -> Result<u64, sqlx::Error> {
        Ok(query(REMOVE_LINE_SQL)
            .bind(line.into_uuid())
            .bind(buyer.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected())
    }

    pub(crate) async fn clear_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: BuyerUuid,
    ) -> Result<u64, sqlx::Error> {
        Ok(query(CLEAR_CART_SQL)
            .bind(buyer.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected())
    }

    /// Every line in the buyer's cart joined with its product's current price.
    pub(crate) async fn get_priced_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: BuyerUuid,
    ) -> Result<Vec<CartLineView>, sqlx::Error> {
        query_as::<Postgres, CartLineView>(GET_PRICED_LINES_SQL)
            .bind(buyer.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Take purchased quantities off the matching `(product, variation key)`
    /// lines, deleting lines that drop to zero.
    ///
    /// Each `(product, key)` pair must appear at most once in `purchased`.
    pub(crate) async fn remove_purchased_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: BuyerUuid,
        purchased: &[(ProductUuid, String, u32)],
    ) -> Result<u64, sqlx::Error> {
        if purchased.is_empty() {
            return Ok(0);
        }

        let mut products = Vec::with_capacity(purchased.len());
        let mut keys = Vec::with_capacity(purchased.len());
        let mut quantities = Vec::with_capacity(purchased.len());

        for (product, key, quantity) in purchased {
            products.push(product.into_uuid());
            keys.push(key.clone());
            quantities.push(i64::from(*quantity));
        }

        Ok(query(REMOVE_PURCHASED_LINES_SQL)
            .bind(buyer.into_uuid())
            .bind(products)
            .bind(keys)
            .bind(quantities)
            .execute(&mut **tx)
            .await?
            .rows_affected())
    }
}

impl<'r> FromRow<'r, PgRow> for CartLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let variation: Option<Json<Variation>> = row.try_get("variation")?;

        Ok(Self {
            uuid: CartLineUuid::from_uuid(row.try_get("uuid")?),
            buyer_uuid: BuyerUuid::from_uuid(row.try_get("buyer_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            variation: Variation::normalize(variation.map(|json| json.0)),
            quantity: try_get_quantity(row, "quantity")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CartLineView {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let line = CartLine::from_row(row)?;
        let unit_price = try_get_amount(row, "unit_price")?;

        let subtotal =
            line_amount(unit_price, line.quantity).ok_or_else(|| sqlx::Error::ColumnDecode {
                index: "unit_price".to_string(),
                source: "line subtotal overflows".into(),
            })?;

        Ok(Self {
            line,
            shop_uuid: ShopUuid::from_uuid(row.try_get("shop_uuid")?),
            unit_price,
            subtotal,
        })
    }
}

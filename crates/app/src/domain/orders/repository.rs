//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{Connection, FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, types::Json};
use tracing::warn;

use crate::domain::{
    amounts::{to_db_amount, try_get_amount, try_get_quantity},
    carts::variation::Variation,
    coupons::models::CouponUuid,
    orders::{
        factory::{NewOrderLine, OrderDraft},
        models::{
            Order, OrderLine, OrderLineUuid, OrderNumber, OrderStatus, OrderUuid, PaymentStatus,
            ShippingAddress,
        },
        numbers::OrderNumberGenerator,
    },
    parties::{BuyerUuid, ShopUuid},
    products::models::ProductUuid,
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const CREATE_ORDER_LINE_SQL: &str = include_str!("sql/create_order_line.sql");
const FIND_ORDER_SQL: &str = include_str!("sql/find_order.sql");
const GET_BUYER_ORDER_SQL: &str = include_str!("sql/get_buyer_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("sql/lock_order.sql");
const LIST_BUYER_ORDERS_SQL: &str = include_str!("sql/list_buyer_orders.sql");
const GET_ORDER_LINES_SQL: &str = include_str!("sql/get_order_lines.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("sql/update_order_status.sql");

const ORDER_NUMBER_CONSTRAINT: &str = "orders_order_number_key";

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert the order header under a freshly generated number.
    ///
    /// Each attempt runs inside a savepoint so a number collision only rolls
    /// back that insert, not the reservations already made in `tx`. Returns
    /// `None` once `attempts` candidates have all collided.
    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        draft: &OrderDraft,
        numbers: &dyn OrderNumberGenerator,
        attempts: u32,
    ) -> Result<Option<Order>, sqlx::Error> {
        for attempt in 1..=attempts {
            let order_number = numbers.generate();
            let mut savepoint = Connection::begin(&mut **tx).await?;

            match self
                .insert_order(&mut savepoint, draft, &order_number)
                .await
            {
                Ok(order) => {
                    savepoint.commit().await?;

                    return Ok(Some(order));
                }
                Err(error) if is_order_number_collision(&error) => {
                    savepoint.rollback().await?;

                    warn!(attempt, %order_number, "order number collision");
                }
                Err(error) => return Err(error),
            }
        }

        Ok(None)
    }

    async fn insert_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        draft: &OrderDraft,
        order_number: &OrderNumber,
    ) -> Result<Order, sqlx::Error> {
        query_as::<Postgres, Order>(CREATE_ORDER_SQL)
            .bind(draft.uuid.into_uuid())
            .bind(order_number.as_str())
            .bind(draft.buyer_uuid.into_uuid())
            .bind(draft.shop_uuid.into_uuid())
            .bind(draft.coupon_uuid.map(CouponUuid::into_uuid))
            .bind(to_db_amount("subtotal", draft.subtotal)?)
            .bind(to_db_amount("discount", draft.discount)?)
            .bind(to_db_amount("total", draft.total)?)
            .bind(&draft.payment_method)
            .bind(Json(&draft.shipping_address))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_order_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderLine>, sqlx::Error> {
        let mut created = Vec::with_capacity(lines.len());

        for line in lines {
            let position = i32::try_from(line.position)
                .map_err(|e| sqlx::Error::Encode(format!("position: {e}").into()))?;

            let order_line = query_as::<Postgres, OrderLine>(CREATE_ORDER_LINE_SQL)
                .bind(line.uuid.into_uuid())
                .bind(order.into_uuid())
                .bind(line.product_uuid.into_uuid())
                .bind(i64::from(line.quantity))
                .bind(to_db_amount("unit_price", line.unit_price)?)
                .bind(line.variation.clone().map(Json))
                .bind(position)
                .fetch_one(&mut **tx)
                .await?;

            created.push(order_line);
        }

        Ok(created)
    }

    pub(crate) async fn find_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Option<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(FIND_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_buyer_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: BuyerUuid,
        order: OrderUuid,
    ) -> Result<Order, sqlx::Error> {
        query_as::<Postgres, Order>(GET_BUYER_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(buyer.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Load the order and hold its row lock until `tx` ends.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Order, sqlx::Error> {
        query_as::<Postgres, Order>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Newest first.
    pub(crate) async fn list_buyer_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: BuyerUuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(LIST_BUYER_ORDERS_SQL)
            .bind(buyer.into_uuid())
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_order_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<OrderLine>, sqlx::Error> {
        query_as::<Postgres, OrderLine>(GET_ORDER_LINES_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Move the order from `from` to `to`; `None` if it was not in `from`.
    pub(crate) async fn update_order_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(UPDATE_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&mut **tx)
            .await
    }
}

fn is_order_number_collision(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|e| e.constraint())
        .is_some_and(|constraint| constraint == ORDER_NUMBER_CONSTRAINT)
}

fn decode_error(col: &str, e: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    }
}

impl<'r> FromRow<'r, PgRow> for Order {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;
        let payment_status: String = row.try_get("payment_status")?;
        let shipping_address: Json<ShippingAddress> = row.try_get("shipping_address")?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            order_number: OrderNumber::new(row.try_get::<String, _>("order_number")?),
            buyer_uuid: BuyerUuid::from_uuid(row.try_get("buyer_uuid")?),
            shop_uuid: ShopUuid::from_uuid(row.try_get("shop_uuid")?),
            coupon_uuid: row
                .try_get::<Option<uuid::Uuid>, _>("coupon_uuid")?
                .map(CouponUuid::from_uuid),
            subtotal: try_get_amount(row, "subtotal")?,
            discount: try_get_amount(row, "discount")?,
            total: try_get_amount(row, "total")?,
            status: status
                .parse::<OrderStatus>()
                .map_err(|e| decode_error("status", e))?,
            payment_status: payment_status
                .parse::<PaymentStatus>()
                .map_err(|e| decode_error("payment_status", e))?,
            payment_method: row.try_get("payment_method")?,
            shipping_address: shipping_address.0,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let variation: Option<Json<Variation>> = row.try_get("variation")?;
        let position: i32 = row.try_get("position")?;

        Ok(Self {
            uuid: OrderLineUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_quantity(row, "quantity")?,
            unit_price: try_get_amount(row, "unit_price")?,
            variation: Variation::normalize(variation.map(|json| json.0)),
            position: u32::try_from(position).map_err(|e| decode_error("position", e))?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}

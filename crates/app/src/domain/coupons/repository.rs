//! Coupons Repository

use jiff_sqlx::{Timestamp as SqlxTimestamp, ToSqlx};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::{
    amounts::{to_db_amount, try_get_amount},
    coupons::models::{Coupon, CouponUuid, DiscountKind, NewCoupon},
};

const CREATE_COUPON_SQL: &str = include_str!("sql/create_coupon.sql");
const GET_COUPON_SQL: &str = include_str!("sql/get_coupon.sql");
const FIND_COUPON_BY_CODE_SQL: &str = include_str!("sql/find_coupon_by_code.sql");
const REDEEM_COUPON_SQL: &str = include_str!("sql/redeem_coupon.sql");
const DEACTIVATE_COUPON_SQL: &str = include_str!("sql/deactivate_coupon.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCouponsRepository;

impl PgCouponsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: &NewCoupon,
    ) -> Result<Coupon, sqlx::Error> {
        let max_uses = coupon
            .max_uses
            .map(|max_uses| to_db_amount("max_uses", max_uses))
            .transpose()?;

        query_as::<Postgres, Coupon>(CREATE_COUPON_SQL)
            .bind(coupon.uuid.into_uuid())
            .bind(&coupon.code)
            .bind(coupon.kind.as_str())
            .bind(to_db_amount("discount_value", coupon.value)?)
            .bind(to_db_amount("min_order_amount", coupon.min_order_amount)?)
            .bind(max_uses)
            .bind(coupon.starts_at.map(|starts_at| starts_at.to_sqlx()))
            .bind(coupon.ends_at.map(|ends_at| ends_at.to_sqlx()))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<Coupon, sqlx::Error> {
        query_as::<Postgres, Coupon>(GET_COUPON_SQL)
            .bind(coupon.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_coupon_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<Option<Coupon>, sqlx::Error> {
        query_as::<Postgres, Coupon>(FIND_COUPON_BY_CODE_SQL)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Count one use if the coupon is active and below its cap.
    ///
    /// Returns `false` when no row qualified, which under concurrency means
    /// another transaction took the last use first.
    pub(crate) async fn redeem_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(REDEEM_COUPON_SQL)
            .bind(coupon.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    pub(crate) async fn deactivate_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<Coupon, sqlx::Error> {
        query_as::<Postgres, Coupon>(DEACTIVATE_COUPON_SQL)
            .bind(coupon.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for Coupon {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let kind: String = row.try_get("discount_type")?;
        let kind = kind
            .parse::<DiscountKind>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "discount_type".to_string(),
                source: Box::new(e),
            })?;

        let max_uses = row
            .try_get::<Option<i64>, _>("max_uses")?
            .map(u64::try_from)
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "max_uses".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: CouponUuid::from_uuid(row.try_get("uuid")?),
            code: row.try_get("code")?,
            kind,
            value: try_get_amount(row, "discount_value")?,
            min_order_amount: try_get_amount(row, "min_order_amount")?,
            max_uses,
            used_count: try_get_amount(row, "used_count")?,
            starts_at: row
                .try_get::<Option<SqlxTimestamp>, _>("starts_at")?
                .map(SqlxTimestamp::to_jiff),
            ends_at: row
                .try_get::<Option<SqlxTimestamp>, _>("ends_at")?
                .map(SqlxTimestamp::to_jiff),
            active: row.try_get("active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

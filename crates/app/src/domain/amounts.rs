//! Column conversions for money amounts and quantities.
//!
//! Amounts are unsigned minor currency units in Rust and `BIGINT` in the database.

use sqlx::{Row, postgres::PgRow};

pub(crate) fn try_get_amount(row: &PgRow, col: &str) -> Result<u64, sqlx::Error> {
    let amount_i64: i64 = row.try_get(col)?;

    u64::try_from(amount_i64).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn try_get_quantity(row: &PgRow, col: &str) -> Result<u32, sqlx::Error> {
    let quantity_i64: i64 = row.try_get(col)?;

    u32::try_from(quantity_i64).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn to_db_amount(col: &str, amount: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(amount).map_err(|e| sqlx::Error::Encode(format!("{col}: {e}").into()))
}

/// Multiply a unit price by a quantity, `None` on overflow.
pub fn line_amount(unit_price: u64, quantity: u32) -> Option<u64> {
    unit_price.checked_mul(u64::from(quantity))
}

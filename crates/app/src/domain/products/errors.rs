//! Products service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product already exists")]
    AlreadyExists,

    #[error("product not found")]
    NotFound,

    /// Price or stock does not fit a `BIGINT` column, or breaks a column check.
    #[error("price or stock out of range")]
    OutOfRange,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ProductsServiceError {
    fn from(error: Error) -> Self {
        match &error {
            Error::RowNotFound => return Self::NotFound,
            Error::Encode(_) => return Self::OutOfRange,
            _ => {}
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::CheckViolation) => Self::OutOfRange,
            _ => Self::Sql(error),
        }
    }
}

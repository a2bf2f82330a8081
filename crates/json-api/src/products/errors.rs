//! Errors

use salvo::http::StatusError;
use tracing::error;

use souk_app::domain::stock::StockError;

pub(crate) fn into_status_error(error: StockError) -> StatusError {
    match error {
        StockError::NotFound(_) => StatusError::not_found().brief("Product not found"),
        StockError::InvalidQuantity | StockError::OutOfRange => {
            StatusError::bad_request().brief("Invalid stock quantity")
        }
        StockError::Sql(source) => {
            error!("failed to read stock level: {source}");

            StatusError::internal_server_error()
        }
    }
}

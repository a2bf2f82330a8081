//! Errors

use salvo::http::StatusError;
use tracing::error;

use souk_app::domain::carts::CartsServiceError;

pub(crate) fn into_status_error(error: CartsServiceError) -> StatusError {
    match error {
        CartsServiceError::AlreadyExists => {
            StatusError::conflict().brief("Cart line already exists")
        }
        CartsServiceError::NotFound => StatusError::not_found().brief("Cart line not found"),
        CartsServiceError::InvalidQuantity => {
            StatusError::bad_request().brief("Quantity must be at least one")
        }
        CartsServiceError::InvalidReference => StatusError::bad_request().brief("Unknown product"),
        CartsServiceError::MissingRequiredData | CartsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid cart payload")
        }
        CartsServiceError::Sql(source) => {
            error!("cart storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}

//! Cart Handlers

pub(crate) mod add;
pub(crate) mod clear;
pub(crate) mod get;
pub(crate) mod remove;
pub(crate) mod update;

use std::collections::BTreeMap;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souk_app::domain::carts::models::CartLine;

/// Cart Line Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartLineResponse {
    /// Line UUID
    pub uuid: Uuid,

    /// Product UUID
    pub product_uuid: Uuid,

    /// Chosen attributes, such as size or colour
    pub variation: Option<BTreeMap<String, String>>,

    /// Quantity
    pub quantity: u32,
}

impl From<CartLine> for CartLineResponse {
    fn from(line: CartLine) -> Self {
        Self {
            uuid: line.uuid.into_uuid(),
            product_uuid: line.product_uuid.into_uuid(),
            variation: line.variation.map(Into::into),
            quantity: line.quantity,
        }
    }
}

//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

use souk_app::domain::parties::BuyerUuid;

const BUYER_UUID_DEPOT_KEY: &str = "buyer_uuid";

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    fn insert_buyer_uuid(&mut self, buyer: BuyerUuid);

    /// The authenticated buyer, or `401` when the identity layer did not run.
    fn buyer_uuid_or_401(&self) -> Result<BuyerUuid, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_buyer_uuid(&mut self, buyer: BuyerUuid) {
        self.insert(BUYER_UUID_DEPOT_KEY, buyer);
    }

    fn buyer_uuid_or_401(&self) -> Result<BuyerUuid, StatusError> {
        self.get::<BuyerUuid>(BUYER_UUID_DEPOT_KEY)
            .copied()
            .map_err(|_ignored| StatusError::unauthorized().brief("Missing buyer identity"))
    }
}

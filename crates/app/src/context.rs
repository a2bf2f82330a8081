//! App Context

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::{
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        checkout::{CheckoutService, CheckoutSettings, PgCheckoutService},
        coupons::{CouponsService, PgCouponsService},
        notifications::{
            CheckoutNotifier, LogNotifier, NotificationError, WebhookConfig, WebhookNotifier,
        },
        orders::{OrdersService, PgOrdersService},
        products::{PgProductsService, ProductsService},
        stock::{PgStockService, StockService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to build order notifier")]
    Notifier(#[source] NotificationError),
}

/// Everything needed to wire the services to a database.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub max_connections: u32,
    pub checkout: CheckoutSettings,
    /// Post placed orders here; when absent they are only logged.
    pub webhook: Option<WebhookConfig>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            checkout: CheckoutSettings::default(),
            webhook: None,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub stock: Arc<dyn StockService>,
    pub carts: Arc<dyn CartsService>,
    pub coupons: Arc<dyn CouponsService>,
    pub orders: Arc<dyn OrdersService>,
    pub checkout: Arc<dyn CheckoutService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails or the
    /// configured webhook client cannot be built.
    pub async fn from_database_url(url: &str, settings: AppSettings) -> Result<Self, AppInitError> {
        let pool = database::connect_with_max_connections(url, settings.max_connections)
            .await
            .map_err(AppInitError::Database)?;

        let notifier: Arc<dyn CheckoutNotifier> = match settings.webhook {
            Some(webhook) => {
                info!(url = %webhook.url, "posting placed orders to webhook");

                Arc::new(WebhookNotifier::new(webhook).map_err(AppInitError::Notifier)?)
            }
            None => Arc::new(LogNotifier),
        };

        Ok(Self::from_db(&Db::new(pool), settings.checkout, notifier))
    }

    #[must_use]
    pub fn from_db(
        db: &Db,
        checkout: CheckoutSettings,
        notifier: Arc<dyn CheckoutNotifier>,
    ) -> Self {
        Self {
            products: Arc::new(PgProductsService::new(db.clone())),
            stock: Arc::new(PgStockService::new(db.clone())),
            carts: Arc::new(PgCartsService::new(db.clone())),
            coupons: Arc::new(PgCouponsService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone())),
            checkout: Arc::new(PgCheckoutService::new(db.clone(), checkout, notifier)),
        }
    }
}

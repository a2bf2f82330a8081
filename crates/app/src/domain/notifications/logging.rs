//! Logging notifier.

use async_trait::async_trait;
use tracing::info;

use crate::domain::notifications::{
    errors::NotificationError, models::OrderPlaced, notifier::CheckoutNotifier,
};

/// Writes each placed order to the log. Used when no webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl CheckoutNotifier for LogNotifier {
    async fn order_placed(&self, event: OrderPlaced) -> Result<(), NotificationError> {
        info!(
            order_uuid = %event.order_uuid,
            order_number = %event.order_number,
            buyer_uuid = %event.buyer_uuid,
            shop_uuid = %event.shop_uuid,
            total = event.total,
            "order placed"
        );

        Ok(())
    }
}

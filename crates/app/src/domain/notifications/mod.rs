//! Notifications
//!
//! Post-commit announcements of placed orders. Delivery is best effort: a
//! failed notification is logged and never affects the order.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

pub mod errors;
pub mod logging;
pub mod models;
pub mod notifier;
pub mod webhook;

pub use errors::NotificationError;
pub use logging::LogNotifier;
pub use models::OrderPlaced;
pub use notifier::*;
pub use webhook::{WebhookConfig, WebhookNotifier};

/// Deliver `event` on a background task, logging any failure.
pub fn dispatch(notifier: Arc<dyn CheckoutNotifier>, event: OrderPlaced) -> JoinHandle<()> {
    let span = info_span!(
        "notifications.dispatch",
        order_uuid = %event.order_uuid,
        order_number = %event.order_number,
    );

    tokio::spawn(
        async move {
            match notifier.order_placed(event).await {
                Ok(()) => debug!("order notification delivered"),
                Err(error) => warn!(%error, "order notification failed"),
            }
        }
        .instrument(span),
    )
}

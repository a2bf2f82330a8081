//! Notifier seam.

use async_trait::async_trait;
use mockall::automock;

use crate::domain::notifications::{errors::NotificationError, models::OrderPlaced};

#[automock]
#[async_trait]
pub trait CheckoutNotifier: Send + Sync {
    /// Announce a committed order.
    async fn order_placed(&self, event: OrderPlaced) -> Result<(), NotificationError>;
}

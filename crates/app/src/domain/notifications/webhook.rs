//! Webhook notifier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::notifications::{
    errors::NotificationError, models::OrderPlaced, notifier::CheckoutNotifier,
};

/// Where and how long to wait when posting order events.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Absolute URL receiving a JSON `POST` per placed order.
    pub url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// Posts each placed order as JSON to a configured URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    config: WebhookConfig,
    http: Client,
}

impl WebhookNotifier {
    /// Build a notifier with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: WebhookConfig) -> Result<Self, NotificationError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }
}

#[async_trait]
impl CheckoutNotifier for WebhookNotifier {
    #[tracing::instrument(
        name = "notifications.webhook.order_placed",
        skip(self, event),
        fields(order_number = %event.order_number),
        err
    )]
    async fn order_placed(&self, event: OrderPlaced) -> Result<(), NotificationError> {
        let response = self
            .http
            .post(&self.config.url)
            .json(&event)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();

            return Err(NotificationError::Rejected { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use crate::domain::{
        orders::models::{OrderNumber, OrderUuid},
        parties::{BuyerUuid, ShopUuid},
    };

    use super::*;

    #[tokio::test]
    async fn unreachable_receiver_is_an_http_error() -> Result<(), NotificationError> {
        let notifier = WebhookNotifier::new(WebhookConfig {
            url: "http://127.0.0.1:9/orders".to_string(),
            timeout: Duration::from_millis(500),
        })?;

        let result = notifier
            .order_placed(OrderPlaced {
                order_uuid: OrderUuid::new(),
                order_number: OrderNumber::new("ORD-20260101-AAAAAAAA"),
                buyer_uuid: BuyerUuid::new(),
                shop_uuid: ShopUuid::new(),
                total: 1_00,
                placed_at: Timestamp::now(),
            })
            .await;

        assert!(matches!(result, Err(NotificationError::Http(_))));

        Ok(())
    }
}

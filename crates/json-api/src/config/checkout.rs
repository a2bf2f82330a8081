//! Checkout Config

use std::time::Duration;

use clap::Args;

use souk_app::{
    context::AppSettings,
    domain::{checkout::CheckoutSettings, notifications::WebhookConfig},
};

/// Checkout settings.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// Upper bound on a whole checkout, in milliseconds.
    #[arg(long, env = "CHECKOUT_TIMEOUT_MS", default_value_t = 10_000_u64)]
    pub checkout_timeout_ms: u64,

    /// Per-statement and lock wait limit inside a checkout, in milliseconds.
    #[arg(long, env = "CHECKOUT_STATEMENT_TIMEOUT_MS", default_value_t = 5_000_u64)]
    pub checkout_statement_timeout_ms: u64,

    /// Order numbers to try before giving up on a checkout.
    #[arg(long, env = "ORDER_NUMBER_ATTEMPTS", default_value_t = 3_u32)]
    pub order_number_attempts: u32,

    /// Endpoint receiving placed orders. Orders are only logged when unset.
    #[arg(long, env = "ORDER_WEBHOOK_URL")]
    pub order_webhook_url: Option<String>,

    /// Webhook request timeout in milliseconds.
    #[arg(long, env = "ORDER_WEBHOOK_TIMEOUT_MS", default_value_t = 2_000_u64)]
    pub order_webhook_timeout_ms: u64,
}

impl CheckoutConfig {
    /// Application settings for these checkout options.
    #[must_use]
    pub fn app_settings(&self, max_connections: u32) -> AppSettings {
        AppSettings {
            max_connections,
            checkout: CheckoutSettings {
                timeout: Duration::from_millis(self.checkout_timeout_ms),
                statement_timeout: Duration::from_millis(self.checkout_statement_timeout_ms),
                order_number_attempts: self.order_number_attempts,
            },
            webhook: self.order_webhook_url.clone().map(|url| WebhookConfig {
                url,
                timeout: Duration::from_millis(self.order_webhook_timeout_ms),
            }),
        }
    }
}

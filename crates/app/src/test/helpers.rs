//! Test Helpers

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{
    notifications::{CheckoutNotifier, NotificationError, OrderPlaced},
    orders::{models::OrderNumber, numbers::OrderNumberGenerator},
};

pub(crate) use super::context::checkout_details;

/// Forwards every event to a channel, then succeeds or fails as configured.
#[derive(Debug)]
pub(crate) struct ChannelNotifier {
    sender: mpsc::UnboundedSender<OrderPlaced>,
    fail: bool,
}

impl ChannelNotifier {
    pub(crate) fn new(fail: bool) -> (Self, mpsc::UnboundedReceiver<OrderPlaced>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        (Self { sender, fail }, receiver)
    }
}

#[async_trait]
impl CheckoutNotifier for ChannelNotifier {
    async fn order_placed(&self, event: OrderPlaced) -> Result<(), NotificationError> {
        let _ = self.sender.send(event);

        if self.fail {
            return Err(NotificationError::Unavailable("receiver down".to_string()));
        }

        Ok(())
    }
}

/// Hands out the given numbers in order, repeating the last one forever.
#[derive(Debug)]
pub(crate) struct ScriptedOrderNumbers {
    numbers: Mutex<VecDeque<String>>,
    last: String,
}

impl ScriptedOrderNumbers {
    pub(crate) fn new(numbers: &[&str]) -> Self {
        Self {
            numbers: Mutex::new(numbers.iter().map(|n| (*n).to_string()).collect()),
            last: numbers.last().map_or_else(String::new, |n| (*n).to_string()),
        }
    }
}

impl OrderNumberGenerator for ScriptedOrderNumbers {
    fn generate(&self) -> OrderNumber {
        let next = self
            .numbers
            .lock()
            .expect("order number script poisoned")
            .pop_front();

        OrderNumber::new(next.unwrap_or_else(|| self.last.clone()))
    }
}

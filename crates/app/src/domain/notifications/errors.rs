//! Notification errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// Transport or serialization failure talking to the receiver.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The receiver answered with a non-2xx status.
    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

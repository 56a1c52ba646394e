//! Chat delivery.
//!
//! [`Notification`] is the structured message the composer produces;
//! [`ChatDelivery`] is the seam through which the scheduler sends it. The
//! Discord backend DMs the subscriber an embed. Delivery failure is
//! reported through [`DeliveryError`] and handled by the caller — it is
//! logged and the subscription's recorded status still advances, so a
//! transition is never redelivered.

mod discord;
mod message;

pub use discord::DiscordDelivery;
pub use message::{
    Notification, NotificationField, COLOR_BLUE, COLOR_BLURPLE, COLOR_GREEN, FOOTER_LEGEND,
};

use async_trait::async_trait;
use thiserror::Error;

/// Failure to deliver a notification to one subscriber.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The HTTP request failed (network error, timeout, non-2xx status).
    ///
    /// Covers unreachable and blocked recipients: Discord answers those
    /// with 4xx statuses, which `error_for_status` folds in here.
    #[error("delivery request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The recipient could not be reached.
    #[error("recipient {0} unreachable")]
    Unreachable(u64),
}

/// Trait for chat delivery backends.
#[async_trait]
pub trait ChatDelivery: Send + Sync {
    /// Sends a notification to one subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the recipient is unreachable; the
    /// engine logs this and moves on.
    async fn deliver(
        &self,
        subscriber_id: u64,
        notification: &Notification,
    ) -> Result<(), DeliveryError>;
}

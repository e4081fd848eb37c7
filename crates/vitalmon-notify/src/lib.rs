//! Email notification for persisted alerts.
//!
//! [`router::NotificationRouter`] decides from the subject's preferences
//! whether an alert is emailed, renders the severity template and hands it
//! to an [`EmailTransport`]. The [`outbox`] decouples that work from the
//! write path: persisted alerts are queued, a worker routes them and
//! records every outcome through a [`DeliveryLog`].

pub mod channels;
pub mod error;
pub mod outbox;
pub mod router;
pub mod templates;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use vitalmon_common::types::{DeliveryRecord, NotificationPreferences};

pub use error::{NotifyError, Result};

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Returned by a transport that accepted a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: String,
}

/// An outbound email service.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Delivers the message.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails after retries (if applicable).
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt>;

    /// Returns the transport name (e.g. `"smtp"`).
    fn transport_name(&self) -> &str;
}

/// Read access to a subject's notification preferences.
#[async_trait]
pub trait PreferenceSource: Send + Sync {
    async fn preferences(&self, subject_id: &str) -> Result<NotificationPreferences>;
}

/// Sink for notification outcomes.
#[async_trait]
pub trait DeliveryLog: Send + Sync {
    async fn record(&self, record: &DeliveryRecord) -> Result<()>;
}

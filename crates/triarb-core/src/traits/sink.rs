//! Subscriber sink trait.

use crate::error::DeliveryError;

/// Something a published message can be pushed to.
///
/// Implementations must not block: a slow subscriber reports
/// [`DeliveryError::Full`] instead of stalling the publisher.
pub trait SubscriberSink: Send + Sync {
    /// Deliver one text message.
    fn deliver(&self, message: &str) -> Result<(), DeliveryError>;
}

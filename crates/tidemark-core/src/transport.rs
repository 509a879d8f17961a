//! Message transport boundary.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::store::StoredEvent;

/// Black-box publish capability for committed events.
///
/// Implementations deliver to a topic or queue. Returning `Ok` means the
/// transport has accepted responsibility for the message; the outbox pump
/// only advances its cursor past that point. End-to-end delivery is
/// at-least-once and consumers deduplicate on `event_id`.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Publishes one event to a destination.
    async fn publish(&self, destination: &str, event: &StoredEvent) -> Result<(), TransportError>;
}

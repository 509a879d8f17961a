//! Event store and dispatch cursor boundaries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EventStoreError;
use crate::event::EventContext;

/// Stored representation of a domain event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Stream this event belongs to.
    pub stream_id: String,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Position within the stream, starting at 1.
    pub sequence_number: i64,
    /// Causation, actor, and timing context.
    pub context: EventContext,
}

/// A stored event paired with its position in the global append order.
#[derive(Debug, Clone)]
pub struct SequencedEvent {
    /// Global append-order position across all streams, starting at 1.
    /// Best-effort FIFO by append time, not causally ordered across streams.
    pub position: u64,
    /// The stored event.
    pub event: StoredEvent,
}

/// Append-only event store boundary.
///
/// Implementations must be safe for concurrent use across streams; writers
/// to a single stream are arbitrated by the conditional version check, not
/// by locks held across calls.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Loads all events for a stream, ordered by sequence number. Returns
    /// an empty vector if the stream does not exist.
    async fn read_stream(&self, stream_id: &str) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Appends events to a stream on the condition that its current version
    /// equals `expected_version`. Atomic per call: either every event is
    /// appended contiguously or none is.
    ///
    /// Returns the stream's new version.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError::Conflict`] when the stream's version has
    /// moved since the caller loaded it, [`EventStoreError::Storage`] on
    /// I/O failure.
    async fn append(
        &self,
        stream_id: &str,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, EventStoreError>;

    /// Reads up to `limit` committed events with a global position greater
    /// than `position`, across all streams, in append order.
    async fn read_after(
        &self,
        position: u64,
        limit: usize,
    ) -> Result<Vec<SequencedEvent>, EventStoreError>;
}

/// Durable storage for outbox dispatch cursors.
#[async_trait]
pub trait DispatchCursorStore: Send + Sync {
    /// Loads the last persisted position for a consumer group. `None` means
    /// the consumer has not dispatched anything yet.
    async fn load(&self, consumer_group: &str) -> Result<Option<u64>, EventStoreError>;

    /// Persists the cursor for a consumer group. Cursors advance
    /// monotonically; implementations may reject or ignore regressions.
    async fn save(&self, consumer_group: &str, position: u64) -> Result<(), EventStoreError>;
}

//! Runtime error taxonomy.

use std::time::Duration;

use thiserror::Error;

/// Malformed event history. Replay failures indicate store corruption and
/// are never retried.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// A gap, duplicate, or reordering in the stream's sequence numbers.
    #[error("corrupt history for stream {stream_id}: expected sequence {expected}, found {found}")]
    NonContiguous {
        /// The stream being replayed.
        stream_id: String,
        /// The sequence number the next event was required to carry.
        expected: i64,
        /// The sequence number actually found.
        found: i64,
    },

    /// An event belonging to a different stream appeared in the history.
    #[error("event at sequence {sequence_number} belongs to stream {found}, not {expected}")]
    ForeignStream {
        /// The stream being replayed.
        expected: String,
        /// The stream the event actually belongs to.
        found: String,
        /// The sequence number of the offending event.
        sequence_number: i64,
    },

    /// A stored payload could not be decoded into a known event variant.
    #[error("undecodable {event_type} event at sequence {sequence_number} in stream {stream_id}: {reason}")]
    Undecodable {
        /// The stream being replayed.
        stream_id: String,
        /// The sequence number of the offending event.
        sequence_number: i64,
        /// The stored type discriminator.
        event_type: String,
        /// Decoder failure detail.
        reason: String,
    },
}

/// Failures at the event store boundary.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Another writer appended to the stream first. Recoverable: reload,
    /// re-decide, retry.
    #[error("concurrency conflict on stream {stream_id}: expected version {expected}, found {actual}")]
    Conflict {
        /// The stream that had the conflict.
        stream_id: String,
        /// The version the append was conditioned on.
        expected: i64,
        /// The version the stream actually had.
        actual: i64,
    },

    /// I/O or durability failure in the storage adapter. Reads may be
    /// retried; a failed append must not be blindly retried because the
    /// adapter does not deduplicate.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Failures surfaced by the aggregate repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The caller required existing history and the stream has none.
    #[error("stream not found: {0}")]
    NotFound(String),

    /// The stream's history could not be replayed.
    #[error(transparent)]
    Replay(#[from] ReplayError),

    /// The event store rejected or failed the operation.
    #[error(transparent)]
    Store(#[from] EventStoreError),

    /// The store did not respond within the caller-specified bound. A
    /// timed-out flush leaves pending events intact and is safe to retry.
    #[error("event store did not respond within {0:?}")]
    Timeout(Duration),
}

impl RepositoryError {
    /// True when the failure is an optimistic concurrency conflict the
    /// caller can resolve by reloading, re-deciding, and retrying.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(EventStoreError::Conflict { .. }))
    }
}

/// Failures at the message transport boundary. Never surfaced to command
/// callers; the outbox pump retries them with backoff.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport did not accept the message.
    #[error("publish to {destination} failed: {reason}")]
    Publish {
        /// The topic or queue the publish targeted.
        destination: String,
        /// Transport failure detail.
        reason: String,
    },
}

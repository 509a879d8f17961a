//! Test stores — failing `EventStore` and `DispatchCursorStore` doubles.

use async_trait::async_trait;

use tidemark_core::error::EventStoreError;
use tidemark_core::store::{DispatchCursorStore, EventStore, SequencedEvent, StoredEvent};

/// An event store that always returns a storage error. Useful for testing
/// error-handling and backoff paths.
#[derive(Debug, Default)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn read_stream(&self, _stream_id: &str) -> Result<Vec<StoredEvent>, EventStoreError> {
        Err(EventStoreError::Storage("connection refused".to_owned()))
    }

    async fn append(
        &self,
        _stream_id: &str,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<i64, EventStoreError> {
        Err(EventStoreError::Storage("connection refused".to_owned()))
    }

    async fn read_after(
        &self,
        _position: u64,
        _limit: usize,
    ) -> Result<Vec<SequencedEvent>, EventStoreError> {
        Err(EventStoreError::Storage("connection refused".to_owned()))
    }
}

/// A cursor store that answers loads with "nothing persisted" and fails
/// every save. Models a consumer that can publish but keeps losing its
/// dispatch progress.
#[derive(Debug, Default)]
pub struct FailingCursorStore;

#[async_trait]
impl DispatchCursorStore for FailingCursorStore {
    async fn load(&self, _consumer_group: &str) -> Result<Option<u64>, EventStoreError> {
        Ok(None)
    }

    async fn save(&self, _consumer_group: &str, _position: u64) -> Result<(), EventStoreError> {
        Err(EventStoreError::Storage("cursor write refused".to_owned()))
    }
}

//! In-memory storage adapters.
//!
//! Used by tests and embedded deployments. One lock guards both the
//! per-stream logs and the global append-order log, which makes the
//! conditional append atomic with respect to concurrent writers.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use tidemark_core::error::EventStoreError;
use tidemark_core::store::{DispatchCursorStore, EventStore, SequencedEvent, StoredEvent};

#[derive(Debug, Default)]
struct Log {
    streams: HashMap<String, Vec<StoredEvent>>,
    global: Vec<SequencedEvent>,
}

/// In-memory event store with compare-and-swap conditional appends.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    log: Mutex<Log>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> Result<MutexGuard<'_, Log>, EventStoreError> {
        self.log
            .lock()
            .map_err(|_| EventStoreError::Storage("event log lock poisoned".to_owned()))
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn read_stream(&self, stream_id: &str) -> Result<Vec<StoredEvent>, EventStoreError> {
        let log = self.locked()?;
        Ok(log.streams.get(stream_id).cloned().unwrap_or_default())
    }

    #[allow(clippy::cast_possible_wrap)]
    async fn append(
        &self,
        stream_id: &str,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, EventStoreError> {
        let mut log = self.locked()?;

        {
            let stream = log.streams.entry(stream_id.to_owned()).or_default();
            let actual = stream.len() as i64;
            if actual != expected_version {
                return Err(EventStoreError::Conflict {
                    stream_id: stream_id.to_owned(),
                    expected: expected_version,
                    actual,
                });
            }
            for (offset, event) in events.iter().enumerate() {
                let sequence = expected_version + offset as i64 + 1;
                if event.sequence_number != sequence {
                    return Err(EventStoreError::Storage(format!(
                        "event out of sequence in stream {stream_id}: expected {sequence}, got {}",
                        event.sequence_number
                    )));
                }
            }
            stream.extend_from_slice(events);
        }

        for event in events {
            let position = log.global.len() as u64 + 1;
            log.global.push(SequencedEvent {
                position,
                event: event.clone(),
            });
        }

        Ok(expected_version + events.len() as i64)
    }

    async fn read_after(
        &self,
        position: u64,
        limit: usize,
    ) -> Result<Vec<SequencedEvent>, EventStoreError> {
        let log = self.locked()?;
        let start = usize::try_from(position)
            .map_err(|_| EventStoreError::Storage(format!("position {position} out of range")))?;
        Ok(log.global.iter().skip(start).take(limit).cloned().collect())
    }
}

/// In-memory dispatch cursor store. Cursors only move forward; saves that
/// would regress a cursor are ignored.
#[derive(Debug, Default)]
pub struct InMemoryCursorStore {
    cursors: Mutex<HashMap<String, u64>>,
}

impl InMemoryCursorStore {
    /// Creates an empty cursor store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DispatchCursorStore for InMemoryCursorStore {
    async fn load(&self, consumer_group: &str) -> Result<Option<u64>, EventStoreError> {
        let cursors = self
            .cursors
            .lock()
            .map_err(|_| EventStoreError::Storage("cursor lock poisoned".to_owned()))?;
        Ok(cursors.get(consumer_group).copied())
    }

    async fn save(&self, consumer_group: &str, position: u64) -> Result<(), EventStoreError> {
        let mut cursors = self
            .cursors
            .lock()
            .map_err(|_| EventStoreError::Storage("cursor lock poisoned".to_owned()))?;
        let entry = cursors.entry(consumer_group.to_owned()).or_insert(0);
        if position > *entry {
            *entry = position;
        }
        Ok(())
    }
}

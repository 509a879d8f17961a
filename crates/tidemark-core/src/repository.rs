//! Aggregate repository: the unit of work over an event store.

use std::sync::Arc;
use std::time::Duration;

use crate::aggregate::AggregateRoot;
use crate::error::RepositoryError;
use crate::event::DomainEvent;
use crate::store::{EventStore, StoredEvent};

/// Result of attempting to commit one tracked aggregate during a flush.
#[derive(Debug)]
pub struct FlushOutcome {
    /// The stream the outcome refers to.
    pub stream_id: String,
    /// New stream version on success, the failure otherwise. A conflict
    /// leaves the aggregate's pending events intact for reload and retry.
    pub result: Result<i64, RepositoryError>,
}

/// Unit of work that loads aggregates from an event store and commits their
/// pending events with optimistic concurrency.
///
/// A repository instance is owned by one logical unit of work, and tracked
/// aggregates are reached exclusively through it. Units of work over
/// different streams proceed fully in parallel against the same store; the
/// store's conditional append arbitrates writers to the same stream.
pub struct AggregateRepository<A: AggregateRoot> {
    store: Arc<dyn EventStore>,
    tracked: Vec<A>,
    timeout: Option<Duration>,
}

impl<A: AggregateRoot> AggregateRepository<A> {
    /// Creates a repository over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            tracked: Vec::new(),
            timeout: None,
        }
    }

    /// Bounds every store call made by this repository. A timed-out load or
    /// flush leaves the aggregate unchanged and is safe to retry.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the tracked aggregate for `stream_id`, loading and replaying
    /// its history on first access. An absent stream yields a fresh
    /// aggregate at version 0.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the store fails, the history is
    /// corrupt, or the configured timeout elapses.
    pub async fn get(&mut self, stream_id: &str) -> Result<&mut A, RepositoryError> {
        if let Some(index) = self.position_of(stream_id) {
            return Ok(&mut self.tracked[index]);
        }
        self.load(stream_id, false).await
    }

    /// Like [`get`](Self::get), but fails when the stream has no history.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the stream does not exist;
    /// otherwise as [`get`](Self::get).
    pub async fn require(&mut self, stream_id: &str) -> Result<&mut A, RepositoryError> {
        if let Some(index) = self.position_of(stream_id) {
            return Ok(&mut self.tracked[index]);
        }
        self.load(stream_id, true).await
    }

    /// Commits pending events for every tracked aggregate.
    ///
    /// Streams are appended independently; a conflict on one does not roll
    /// back the others, and outcomes are reported per aggregate in tracking
    /// order. Aggregates without pending events are skipped. On success the
    /// aggregate's pending buffer is cleared; on any failure it is left
    /// intact so the caller may reload, re-decide, and retry.
    pub async fn flush(&mut self) -> Vec<FlushOutcome> {
        let store = Arc::clone(&self.store);
        let timeout = self.timeout;
        let mut outcomes = Vec::new();

        for aggregate in &mut self.tracked {
            if aggregate.uncommitted_events().is_empty() {
                continue;
            }
            let stream_id = aggregate.stream_id().to_owned();
            let pending: Vec<StoredEvent> = aggregate
                .uncommitted_events()
                .iter()
                .map(DomainEvent::to_stored)
                .collect();
            let expected = aggregate.committed_version();

            let result =
                Self::append_bounded(store.as_ref(), timeout, &stream_id, expected, &pending).await;
            match &result {
                Ok(version) => {
                    aggregate.clear_uncommitted_events();
                    tracing::debug!(
                        stream_id = %stream_id,
                        version,
                        count = pending.len(),
                        "committed pending events"
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        stream_id = %stream_id,
                        %error,
                        "flush failed; pending events retained"
                    );
                }
            }
            outcomes.push(FlushOutcome { stream_id, result });
        }
        outcomes
    }

    fn position_of(&self, stream_id: &str) -> Option<usize> {
        self.tracked
            .iter()
            .position(|aggregate| aggregate.stream_id() == stream_id)
    }

    async fn load(
        &mut self,
        stream_id: &str,
        must_exist: bool,
    ) -> Result<&mut A, RepositoryError> {
        let read = self.store.read_stream(stream_id);
        let history = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| RepositoryError::Timeout(limit))?,
            None => read.await,
        }?;

        if must_exist && history.is_empty() {
            return Err(RepositoryError::NotFound(stream_id.to_owned()));
        }

        let mut aggregate = A::new(stream_id.to_owned());
        aggregate.replay(&history)?;
        tracing::debug!(
            stream_id,
            version = aggregate.version(),
            "loaded aggregate from stream"
        );

        let index = self.tracked.len();
        self.tracked.push(aggregate);
        Ok(&mut self.tracked[index])
    }

    async fn append_bounded(
        store: &dyn EventStore,
        timeout: Option<Duration>,
        stream_id: &str,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, RepositoryError> {
        let append = store.append(stream_id, expected_version, events);
        let version = match timeout {
            Some(limit) => tokio::time::timeout(limit, append)
                .await
                .map_err(|_| RepositoryError::Timeout(limit))?,
            None => append.await,
        }?;
        Ok(version)
    }
}

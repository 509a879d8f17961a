//! The outbox pump.
//!
//! A long-lived background loop, fully decoupled from command handling: a
//! failing pump never blocks commits, it only delays delivery.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;

use tidemark_core::error::EventStoreError;
use tidemark_core::store::{DispatchCursorStore, EventStore, SequencedEvent};
use tidemark_core::transport::MessageTransport;

use crate::config::OutboxConfig;

/// Counters collected by a running pump.
#[derive(Debug, Default)]
struct PumpMetrics {
    published: AtomicU64,
    retried: AtomicU64,
    cursor_failures: AtomicU64,
}

/// Point-in-time snapshot of the pump's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpMetricsSnapshot {
    /// Events confirmed by the transport.
    pub published: u64,
    /// Publish attempts that failed and were retried.
    pub retried: u64,
    /// Cursor writes that failed after a confirmed publish.
    pub cursor_failures: u64,
}

enum DrainOutcome {
    /// The store is drained up to the cursor; `0` means nothing was pending.
    Dispatched(usize),
    /// Shutdown was signaled mid-drain; the in-flight publish/cursor pair
    /// was completed before returning.
    ShutDown(usize),
}

/// Tails the event store and publishes committed events to the transport.
///
/// The dispatch cursor is the only shared mutable state: it advances
/// monotonically, and only after the transport has confirmed the publish.
/// A crash between publish confirmation and cursor persistence makes the
/// event eligible for republish on restart; that duplicate is the documented
/// at-least-once cost, and consumers deduplicate on event id.
pub struct OutboxPump {
    store: Arc<dyn EventStore>,
    cursors: Arc<dyn DispatchCursorStore>,
    transport: Arc<dyn MessageTransport>,
    config: OutboxConfig,
    metrics: PumpMetrics,
}

impl OutboxPump {
    /// Creates a pump over the given adapters.
    #[must_use]
    pub fn new(
        store: Arc<dyn EventStore>,
        cursors: Arc<dyn DispatchCursorStore>,
        transport: Arc<dyn MessageTransport>,
        config: OutboxConfig,
    ) -> Self {
        Self {
            store,
            cursors,
            transport,
            config,
            metrics: PumpMetrics::default(),
        }
    }

    /// Returns a snapshot of the pump's counters.
    #[must_use]
    pub fn metrics(&self) -> PumpMetricsSnapshot {
        PumpMetricsSnapshot {
            published: self.metrics.published.load(Ordering::Relaxed),
            retried: self.metrics.retried.load(Ordering::Relaxed),
            cursor_failures: self.metrics.cursor_failures.load(Ordering::Relaxed),
        }
    }

    /// Runs the pump until `shutdown` is signaled (or its sender dropped).
    ///
    /// Store read failures are retried with backoff; transport failures are
    /// retried indefinitely with backoff per event. Shutdown is honored
    /// between publishes and between retry attempts, never between a
    /// confirmed publish and its cursor advance.
    pub async fn run(&self, mut shutdown: watch::Receiver<()>) {
        tracing::info!(
            consumer_group = %self.config.consumer_group,
            destination = %self.config.destination,
            batch_size = self.config.batch_size,
            "outbox pump starting"
        );

        let mut read_failures: u32 = 0;
        loop {
            match self.drain(&mut shutdown).await {
                Ok(DrainOutcome::ShutDown(_)) => break,
                Ok(DrainOutcome::Dispatched(count)) => {
                    read_failures = 0;
                    if count > 0 {
                        tracing::debug!(count, "dispatched outbox batch");
                    }
                    if Self::wait_or_shutdown(&mut shutdown, self.config.poll_interval).await {
                        break;
                    }
                }
                Err(error) => {
                    read_failures += 1;
                    let delay = self.config.backoff_delay(read_failures);
                    tracing::warn!(%error, ?delay, "outbox poll failed; backing off");
                    if Self::wait_or_shutdown(&mut shutdown, delay).await {
                        break;
                    }
                }
            }
        }

        tracing::info!(
            consumer_group = %self.config.consumer_group,
            "outbox pump stopped"
        );
    }

    /// Publishes everything currently pending, in global append order, and
    /// returns the number of events dispatched. Exposed for deterministic
    /// tests and for embedding in external schedulers.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError`] when the cursor or the store cannot be
    /// read. Transport failures are not errors: they are retried with
    /// backoff until the transport accepts.
    pub async fn drain_once(&self) -> Result<usize, EventStoreError> {
        // A private channel whose sender outlives the drain: never signaled.
        let (_armed, mut shutdown) = watch::channel(());
        match self.drain(&mut shutdown).await? {
            DrainOutcome::Dispatched(count) | DrainOutcome::ShutDown(count) => Ok(count),
        }
    }

    async fn drain(
        &self,
        shutdown: &mut watch::Receiver<()>,
    ) -> Result<DrainOutcome, EventStoreError> {
        let group = self.config.consumer_group.as_str();
        let mut cursor = self.cursors.load(group).await?.unwrap_or(0);
        let mut dispatched = 0;

        loop {
            let batch = self.store.read_after(cursor, self.config.batch_size).await?;
            if batch.is_empty() {
                return Ok(DrainOutcome::Dispatched(dispatched));
            }

            for sequenced in &batch {
                if !self.publish_until_accepted(sequenced, shutdown).await {
                    return Ok(DrainOutcome::ShutDown(dispatched));
                }
                self.metrics.published.fetch_add(1, Ordering::Relaxed);
                dispatched += 1;

                // The publish is confirmed; the cursor must move past this
                // event before anything else happens.
                cursor = sequenced.position;
                if let Err(error) = self.cursors.save(group, cursor).await {
                    self.metrics.cursor_failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        %error,
                        position = cursor,
                        event_id = %sequenced.event.event_id,
                        "cursor persistence failed after confirmed publish; \
                         the event may be delivered again after a restart"
                    );
                }

                if shutdown.has_changed().unwrap_or(true) {
                    return Ok(DrainOutcome::ShutDown(dispatched));
                }
            }
        }
    }

    /// Retries the publish with capped exponential backoff until the
    /// transport accepts it or shutdown is signaled. Returns `true` on
    /// confirmation.
    async fn publish_until_accepted(
        &self,
        sequenced: &SequencedEvent,
        shutdown: &mut watch::Receiver<()>,
    ) -> bool {
        let destination = self.config.destination.as_str();
        let mut attempt: u32 = 0;

        loop {
            match self.transport.publish(destination, &sequenced.event).await {
                Ok(()) => return true,
                Err(error) => {
                    attempt += 1;
                    self.metrics.retried.fetch_add(1, Ordering::Relaxed);
                    let delay = self.config.backoff_delay(attempt);
                    tracing::warn!(
                        event_id = %sequenced.event.event_id,
                        position = sequenced.position,
                        attempt,
                        ?delay,
                        %error,
                        "publish failed; retrying with backoff"
                    );
                    if Self::wait_or_shutdown(shutdown, delay).await {
                        return false;
                    }
                }
            }
        }
    }

    /// Sleeps for `delay` unless shutdown arrives first. Returns `true` when
    /// shutdown was signaled (or the sender was dropped).
    async fn wait_or_shutdown(shutdown: &mut watch::Receiver<()>, delay: Duration) -> bool {
        tokio::select! {
            _ = shutdown.changed() => true,
            () = tokio::time::sleep(delay) => false,
        }
    }
}

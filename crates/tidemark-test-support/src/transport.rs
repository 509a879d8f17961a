//! Test transports — recording and failure-injecting `MessageTransport`
//! doubles.

use std::sync::Mutex;

use async_trait::async_trait;

use tidemark_core::error::TransportError;
use tidemark_core::store::StoredEvent;
use tidemark_core::transport::MessageTransport;

/// A transport that records every published event and always accepts.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    published: Mutex<Vec<(String, StoredEvent)>>,
}

impl RecordingTransport {
    /// Creates an empty recording transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all published `(destination, event)` pairs.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<(String, StoredEvent)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn publish(&self, destination: &str, event: &StoredEvent) -> Result<(), TransportError> {
        self.published
            .lock()
            .unwrap()
            .push((destination.to_owned(), event.clone()));
        Ok(())
    }
}

/// A transport that fails a configured number of publishes before accepting,
/// recording what it accepted. Useful for exercising retry and backoff.
#[derive(Debug)]
pub struct FlakyTransport {
    failures_remaining: Mutex<u32>,
    published: Mutex<Vec<StoredEvent>>,
}

impl FlakyTransport {
    /// Creates a transport that fails the next `failures` publishes.
    #[must_use]
    pub fn failing_times(failures: u32) -> Self {
        Self {
            failures_remaining: Mutex::new(failures),
            published: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of the accepted events.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<StoredEvent> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for FlakyTransport {
    async fn publish(&self, destination: &str, event: &StoredEvent) -> Result<(), TransportError> {
        {
            let mut remaining = self.failures_remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TransportError::Publish {
                    destination: destination.to_owned(),
                    reason: "synthetic transport outage".to_owned(),
                });
            }
        }
        self.published.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// A transport that never accepts anything.
#[derive(Debug, Default)]
pub struct RefusingTransport {
    attempts: Mutex<u64>,
}

impl RefusingTransport {
    /// Creates a transport that refuses every publish.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of publish attempts observed.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn attempts(&self) -> u64 {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl MessageTransport for RefusingTransport {
    async fn publish(&self, destination: &str, _event: &StoredEvent) -> Result<(), TransportError> {
        *self.attempts.lock().unwrap() += 1;
        Err(TransportError::Publish {
            destination: destination.to_owned(),
            reason: "broker unavailable".to_owned(),
        })
    }
}

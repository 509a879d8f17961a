//! Configuration for the outbox pump.

use std::time::Duration;

/// Configuration for an [`OutboxPump`](crate::pump::OutboxPump).
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// Consumer group this pump advances the dispatch cursor for. One
    /// active pump instance per group.
    pub consumer_group: String,
    /// Destination topic or queue events are published to.
    pub destination: String,
    /// How often to poll for new events when the store is drained.
    pub poll_interval: Duration,
    /// Maximum number of events to read from the store per poll.
    pub batch_size: usize,
    /// Initial delay for exponential backoff on failures.
    pub retry_delay: Duration,
    /// Maximum delay for exponential backoff.
    pub max_retry_delay: Duration,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            consumer_group: "outbox".to_owned(),
            destination: "events".to_owned(),
            poll_interval: Duration::from_millis(500),
            batch_size: 50,
            retry_delay: Duration::from_millis(1000),
            max_retry_delay: Duration::from_secs(60),
        }
    }
}

impl OutboxConfig {
    /// Returns a builder seeded with the defaults.
    #[must_use]
    pub fn builder() -> OutboxConfigBuilder {
        OutboxConfigBuilder::new()
    }

    /// Delay before the given retry attempt (1-indexed):
    /// `retry_delay * 2^(attempt - 1)`, capped at `max_retry_delay`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        // Exponent capped so the multiplication stays finite well past the
        // point where max_retry_delay takes over.
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(16).min(16);
        let scaled = self.retry_delay.as_secs_f64() * 2f64.powi(exponent);
        Duration::from_secs_f64(scaled.min(self.max_retry_delay.as_secs_f64()))
    }
}

/// Builder for [`OutboxConfig`].
#[derive(Debug, Clone, Default)]
pub struct OutboxConfigBuilder {
    config: OutboxConfig,
}

impl OutboxConfigBuilder {
    /// Creates a builder seeded with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the consumer group name.
    #[must_use]
    pub fn consumer_group(mut self, consumer_group: impl Into<String>) -> Self {
        self.config.consumer_group = consumer_group.into();
        self
    }

    /// Sets the destination topic or queue.
    #[must_use]
    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.config.destination = destination.into();
        self
    }

    /// Sets the idle polling interval.
    #[must_use]
    pub const fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.config.poll_interval = poll_interval;
        self
    }

    /// Sets the per-poll batch size.
    #[must_use]
    pub const fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Sets the initial backoff delay.
    #[must_use]
    pub const fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.config.retry_delay = retry_delay;
        self
    }

    /// Sets the backoff delay cap.
    #[must_use]
    pub const fn max_retry_delay(mut self, max_retry_delay: Duration) -> Self {
        self.config.max_retry_delay = max_retry_delay;
        self
    }

    /// Finalizes the configuration.
    #[must_use]
    pub fn build(self) -> OutboxConfig {
        self.config
    }
}

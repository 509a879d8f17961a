//! Tidemark Outbox — bridges the event store to a message transport.
//!
//! The pump tails the store's global append order, publishes each committed
//! event to the transport, and durably records its dispatch cursor only
//! after the transport confirms. Delivery is at-least-once end to end;
//! downstream consumers deduplicate on event id.

pub mod config;
pub mod pump;

pub use config::{OutboxConfig, OutboxConfigBuilder};
pub use pump::{OutboxPump, PumpMetricsSnapshot};

//! Shared test mocks and utilities for the Tidemark runtime.

mod clock;
mod fixtures;
mod store;
mod transport;

pub use clock::FixedClock;
pub use fixtures::stored_event;
pub use store::{FailingCursorStore, FailingEventStore};
pub use transport::{FlakyTransport, RecordingTransport, RefusingTransport};

//! Event fixtures.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use tidemark_core::event::{Actor, EventContext};
use tidemark_core::store::StoredEvent;

/// Builds a `StoredEvent` with sensible defaults and a fresh event id.
///
/// # Panics
///
/// Never panics; the embedded timestamp is valid.
#[must_use]
pub fn stored_event(stream_id: &str, sequence_number: i64) -> StoredEvent {
    StoredEvent {
        event_id: Uuid::new_v4(),
        stream_id: stream_id.to_owned(),
        event_type: "test.recorded".to_owned(),
        payload: serde_json::json!({"key": "value"}),
        sequence_number,
        context: EventContext::new(
            Uuid::new_v4(),
            Actor::System("test-support".to_owned()),
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ),
    }
}

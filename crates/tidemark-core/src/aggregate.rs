//! Aggregate root abstraction.

use crate::error::ReplayError;
use crate::event::DomainEvent;
use crate::store::StoredEvent;

/// Trait for aggregate roots that reconstitute from event history.
///
/// Implementations hold their stream id, a version counter, and a buffer of
/// uncommitted events. `apply` is the single state transition shared by
/// replaying committed history and recording new events, and it must advance
/// the version by exactly one; [`record`](AggregateRoot::record) relies on
/// that to keep in-memory state identical to a from-scratch replay of
/// history plus pending events.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Creates an empty aggregate for a stream, at version 0.
    fn new(stream_id: String) -> Self
    where
        Self: Sized;

    /// Returns the stream identifier.
    fn stream_id(&self) -> &str;

    /// Returns the current version: the sequence number of the last applied
    /// event, committed or pending.
    fn version(&self) -> i64;

    /// Applies an event to mutate internal state and advance the version.
    fn apply(&mut self, event: &Self::Event);

    /// Returns events recorded but not yet committed.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Mutable access to the uncommitted event buffer. Exists for the
    /// provided [`record`](AggregateRoot::record); domain code should not
    /// push into it directly.
    fn uncommitted_events_mut(&mut self) -> &mut Vec<Self::Event>;

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);

    /// The version the stream had when this aggregate was loaded or last
    /// committed. Appends are conditioned on this value.
    #[allow(clippy::cast_possible_wrap)]
    fn committed_version(&self) -> i64 {
        self.version() - self.uncommitted_events().len() as i64
    }

    /// Returns the sequence number the next recorded event must carry.
    fn next_sequence_number(&self) -> i64 {
        self.version() + 1
    }

    /// Rebuilds state by applying committed history in order.
    ///
    /// Empty history is valid: a brand-new aggregate stays at version 0.
    /// Gaps, duplicates, reordering, events from another stream, and
    /// undecodable payloads are corruption.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] if the history is malformed.
    fn replay(&mut self, history: &[StoredEvent]) -> Result<(), ReplayError>
    where
        Self: Sized,
    {
        for stored in history {
            if stored.stream_id != self.stream_id() {
                return Err(ReplayError::ForeignStream {
                    expected: self.stream_id().to_owned(),
                    found: stored.stream_id.clone(),
                    sequence_number: stored.sequence_number,
                });
            }
            let expected = self.next_sequence_number();
            if stored.sequence_number != expected {
                return Err(ReplayError::NonContiguous {
                    stream_id: self.stream_id().to_owned(),
                    expected,
                    found: stored.sequence_number,
                });
            }
            let event = Self::Event::from_stored(stored)?;
            self.apply(&event);
        }
        Ok(())
    }

    /// Buffers a freshly produced event after applying it to internal state.
    ///
    /// Domain methods construct the event with
    /// [`next_sequence_number`](AggregateRoot::next_sequence_number) and hand
    /// it here. Applying through the same `apply` used during replay keeps
    /// recorded state equal to a replay of history plus pending events.
    fn record(&mut self, event: Self::Event)
    where
        Self: Sized,
    {
        debug_assert_eq!(
            event.metadata().sequence_number,
            self.next_sequence_number(),
            "recorded event must carry the next sequence number"
        );
        self.apply(&event);
        self.uncommitted_events_mut().push(event);
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    //! A minimal tally aggregate used to exercise the replay/record protocol.

    use chrono::{TimeZone, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    use super::AggregateRoot;
    use crate::error::ReplayError;
    use crate::event::{Actor, DomainEvent, EventContext, EventMetadata};
    use crate::store::StoredEvent;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub(crate) enum TallyEventKind {
        Bumped { amount: i64 },
        Reset,
    }

    #[derive(Debug, Clone)]
    pub(crate) struct TallyEvent {
        pub metadata: EventMetadata,
        pub kind: TallyEventKind,
    }

    impl DomainEvent for TallyEvent {
        fn event_type(&self) -> &'static str {
            match &self.kind {
                TallyEventKind::Bumped { .. } => "tally.bumped",
                TallyEventKind::Reset => "tally.reset",
            }
        }

        fn to_payload(&self) -> serde_json::Value {
            serde_json::to_value(&self.kind).expect("TallyEventKind serialization is infallible")
        }

        fn metadata(&self) -> &EventMetadata {
            &self.metadata
        }

        fn from_stored(stored: &StoredEvent) -> Result<Self, ReplayError> {
            let kind = serde_json::from_value(stored.payload.clone()).map_err(|e| {
                ReplayError::Undecodable {
                    stream_id: stored.stream_id.clone(),
                    sequence_number: stored.sequence_number,
                    event_type: stored.event_type.clone(),
                    reason: e.to_string(),
                }
            })?;
            Ok(Self {
                metadata: EventMetadata {
                    event_id: stored.event_id,
                    stream_id: stored.stream_id.clone(),
                    sequence_number: stored.sequence_number,
                    context: stored.context.clone(),
                },
                kind,
            })
        }
    }

    #[derive(Debug)]
    pub(crate) struct Tally {
        stream_id: String,
        version: i64,
        pub total: i64,
        uncommitted_events: Vec<TallyEvent>,
    }

    impl Tally {
        fn context() -> EventContext {
            EventContext::new(
                Uuid::new_v4(),
                Actor::System("tally-tests".to_owned()),
                Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            )
        }

        pub(crate) fn bump(&mut self, amount: i64) {
            let event = TallyEvent {
                metadata: EventMetadata {
                    event_id: Uuid::new_v4(),
                    stream_id: self.stream_id.clone(),
                    sequence_number: self.next_sequence_number(),
                    context: Self::context(),
                },
                kind: TallyEventKind::Bumped { amount },
            };
            self.record(event);
        }

        pub(crate) fn reset(&mut self) {
            let event = TallyEvent {
                metadata: EventMetadata {
                    event_id: Uuid::new_v4(),
                    stream_id: self.stream_id.clone(),
                    sequence_number: self.next_sequence_number(),
                    context: Self::context(),
                },
                kind: TallyEventKind::Reset,
            };
            self.record(event);
        }
    }

    impl AggregateRoot for Tally {
        type Event = TallyEvent;

        fn new(stream_id: String) -> Self {
            Self {
                stream_id,
                version: 0,
                total: 0,
                uncommitted_events: Vec::new(),
            }
        }

        fn stream_id(&self) -> &str {
            &self.stream_id
        }

        fn version(&self) -> i64 {
            self.version
        }

        fn apply(&mut self, event: &Self::Event) {
            match &event.kind {
                TallyEventKind::Bumped { amount } => self.total += amount,
                TallyEventKind::Reset => self.total = 0,
            }
            self.version += 1;
        }

        fn uncommitted_events(&self) -> &[Self::Event] {
            &self.uncommitted_events
        }

        fn uncommitted_events_mut(&mut self) -> &mut Vec<Self::Event> {
            &mut self.uncommitted_events
        }

        fn clear_uncommitted_events(&mut self) {
            self.uncommitted_events.clear();
        }
    }
}

//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReplayError;
use crate::store::StoredEvent;

/// The party responsible for a recorded decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    /// A human operator, identified by user name.
    User(String),
    /// An automated component, identified by service name.
    System(String),
}

/// Context attached to every domain event: what caused the decision, who
/// made it, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventContext {
    /// Identifier of the command or upstream message that caused this event.
    pub causation_id: Uuid,
    /// The actor responsible for the decision.
    pub actor: Actor,
    /// Timestamp of event creation.
    pub recorded_at: DateTime<Utc>,
    /// Context of the causal parent, if any. A back-reference for tracing a
    /// decision chain; the parent event is not owned through this edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<Box<EventContext>>,
}

impl EventContext {
    /// Creates a context with no causal parent.
    #[must_use]
    pub const fn new(causation_id: Uuid, actor: Actor, recorded_at: DateTime<Utc>) -> Self {
        Self {
            causation_id,
            actor,
            recorded_at,
            caused_by: None,
        }
    }

    /// Attaches the context of the causal parent.
    #[must_use]
    pub fn caused_by(mut self, parent: EventContext) -> Self {
        self.caused_by = Some(Box::new(parent));
        self
    }
}

/// Metadata attached to every domain event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier. Downstream consumers deduplicate on it.
    pub event_id: Uuid,
    /// Stream this event belongs to.
    pub stream_id: String,
    /// Monotonically increasing position within the stream, starting at 1.
    pub sequence_number: i64,
    /// Causation, actor, and timing context.
    pub context: EventContext,
}

/// Trait that all domain events implement.
pub trait DomainEvent: Send + Sync + Sized + std::fmt::Debug {
    /// Returns the event type name (used for serialization routing).
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;

    /// Reconstructs the event from its stored form.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Undecodable`] if the stored payload does not
    /// match a known event variant.
    fn from_stored(stored: &StoredEvent) -> Result<Self, ReplayError>;

    /// Converts the event to its stored form for appending.
    fn to_stored(&self) -> StoredEvent {
        let meta = self.metadata();
        StoredEvent {
            event_id: meta.event_id,
            stream_id: meta.stream_id.clone(),
            event_type: self.event_type().to_owned(),
            payload: self.to_payload(),
            sequence_number: meta.sequence_number,
            context: meta.context.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::{Actor, EventContext};

    #[test]
    fn test_context_round_trips_through_json() {
        let context = EventContext::new(
            Uuid::new_v4(),
            Actor::User("quinn".to_owned()),
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        );

        let json = serde_json::to_value(&context).unwrap();
        let decoded: EventContext = serde_json::from_value(json).unwrap();

        assert_eq!(decoded.causation_id, context.causation_id);
        assert_eq!(decoded.actor, context.actor);
        assert_eq!(decoded.recorded_at, context.recorded_at);
        assert!(decoded.caused_by.is_none());
    }

    #[test]
    fn test_caused_by_chain_is_preserved() {
        let root = EventContext::new(
            Uuid::new_v4(),
            Actor::System("scheduler".to_owned()),
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        );
        let child = EventContext::new(
            Uuid::new_v4(),
            Actor::System("reactor".to_owned()),
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 1).unwrap(),
        )
        .caused_by(root.clone());

        let json = serde_json::to_value(&child).unwrap();
        let decoded: EventContext = serde_json::from_value(json).unwrap();

        let parent = decoded.caused_by.expect("parent context should survive");
        assert_eq!(parent.causation_id, root.causation_id);
        assert!(parent.caused_by.is_none());
    }
}

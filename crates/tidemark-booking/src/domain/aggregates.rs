//! Aggregate roots for the Booking context.

use thiserror::Error;
use uuid::Uuid;

use tidemark_core::aggregate::AggregateRoot;
use tidemark_core::clock::Clock;
use tidemark_core::event::{Actor, EventContext, EventMetadata};

use super::events::{BookingCanceled, BookingEvent, BookingEventKind, PurchaseOrderBooked};

/// Domain rules a booking command can violate. These are ordinary business
/// outcomes, not runtime faults; rejecting a command records nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// The slot is already taken by another reference.
    #[error("already booked for reference {reference}")]
    AlreadyBooked {
        /// The reference currently holding the booking.
        reference: String,
    },

    /// There is nothing to cancel.
    #[error("booking {booking_id} has no active reference")]
    NotBooked {
        /// The booking identifier.
        booking_id: String,
    },
}

/// The aggregate root for a purchase-order booking slot.
///
/// At most one reference holds the slot at a time; canceling releases it
/// for re-booking.
#[derive(Debug)]
pub struct Booking {
    stream_id: String,
    version: i64,
    /// The reference currently holding the slot, if any.
    active_reference: Option<String>,
    uncommitted_events: Vec<BookingEvent>,
}

impl Booking {
    /// Returns the reference currently holding the slot.
    #[must_use]
    pub fn active_reference(&self) -> Option<&str> {
        self.active_reference.as_deref()
    }

    fn envelope(&self, causation_id: Uuid, actor: Actor, clock: &dyn Clock) -> EventMetadata {
        EventMetadata {
            event_id: Uuid::new_v4(),
            stream_id: self.stream_id.clone(),
            sequence_number: self.next_sequence_number(),
            context: EventContext::new(causation_id, actor, clock.now()),
        }
    }

    /// Books a purchase-order reference into this slot.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::AlreadyBooked`] if the slot is taken; nothing
    /// is recorded in that case.
    pub fn book(
        &mut self,
        reference: String,
        causation_id: Uuid,
        actor: Actor,
        clock: &dyn Clock,
    ) -> Result<(), BookingError> {
        if let Some(active) = &self.active_reference {
            return Err(BookingError::AlreadyBooked {
                reference: active.clone(),
            });
        }

        let event = BookingEvent {
            metadata: self.envelope(causation_id, actor, clock),
            kind: BookingEventKind::PurchaseOrderBooked(PurchaseOrderBooked {
                booking_id: self.stream_id.clone(),
                reference,
            }),
        };
        self.record(event);
        Ok(())
    }

    /// Cancels the active booking, releasing the slot.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NotBooked`] if the slot is free; nothing is
    /// recorded in that case.
    pub fn cancel(
        &mut self,
        causation_id: Uuid,
        actor: Actor,
        clock: &dyn Clock,
    ) -> Result<(), BookingError> {
        let Some(reference) = self.active_reference.clone() else {
            return Err(BookingError::NotBooked {
                booking_id: self.stream_id.clone(),
            });
        };

        let event = BookingEvent {
            metadata: self.envelope(causation_id, actor, clock),
            kind: BookingEventKind::BookingCanceled(BookingCanceled {
                booking_id: self.stream_id.clone(),
                reference,
            }),
        };
        self.record(event);
        Ok(())
    }
}

impl AggregateRoot for Booking {
    type Event = BookingEvent;

    fn new(stream_id: String) -> Self {
        Self {
            stream_id,
            version: 0,
            active_reference: None,
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
            BookingEventKind::PurchaseOrderBooked(payload) => {
                self.active_reference = Some(payload.reference.clone());
            }
            BookingEventKind::BookingCanceled(_) => {
                self.active_reference = None;
            }
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

//! Domain events for the Booking context.

use serde::{Deserialize, Serialize};

use tidemark_core::error::ReplayError;
use tidemark_core::event::{DomainEvent, EventMetadata};
use tidemark_core::store::StoredEvent;

/// Event type for [`PurchaseOrderBooked`].
pub const PURCHASE_ORDER_BOOKED_EVENT_TYPE: &str = "booking.purchase_order_booked";
/// Event type for [`BookingCanceled`].
pub const BOOKING_CANCELED_EVENT_TYPE: &str = "booking.booking_canceled";

/// Emitted when a purchase-order reference is booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderBooked {
    /// The booking identifier (stream id).
    pub booking_id: String,
    /// The purchase-order reference that was booked.
    pub reference: String,
}

/// Emitted when a booking is canceled, freeing the slot for re-booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCanceled {
    /// The booking identifier (stream id).
    pub booking_id: String,
    /// The reference that was released.
    pub reference: String,
}

/// Event payload variants for the Booking context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEventKind {
    /// A purchase-order reference has been booked.
    PurchaseOrderBooked(PurchaseOrderBooked),
    /// The booking has been canceled.
    BookingCanceled(BookingCanceled),
}

/// Domain event envelope for the Booking context.
#[derive(Debug, Clone)]
pub struct BookingEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: BookingEventKind,
}

impl DomainEvent for BookingEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            BookingEventKind::PurchaseOrderBooked(_) => PURCHASE_ORDER_BOOKED_EVENT_TYPE,
            BookingEventKind::BookingCanceled(_) => BOOKING_CANCELED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("BookingEventKind serialization is infallible")
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

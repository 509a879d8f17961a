//! Commands for the Booking context.

use uuid::Uuid;

use tidemark_core::command::Command;
use tidemark_core::event::Actor;

/// Book a purchase-order reference into a booking slot.
#[derive(Debug, Clone)]
pub struct Book {
    /// Causation identifier carried into the recorded events.
    pub causation_id: Uuid,
    /// The booking slot (stream id).
    pub booking_id: String,
    /// The purchase-order reference to book.
    pub reference: String,
    /// Who is booking.
    pub actor: Actor,
}

/// Cancel the active booking, releasing the slot.
#[derive(Debug, Clone)]
pub struct Cancel {
    /// Causation identifier carried into the recorded events.
    pub causation_id: Uuid,
    /// The booking slot (stream id).
    pub booking_id: String,
    /// Who is canceling.
    pub actor: Actor,
}

impl Command for Book {
    fn command_type(&self) -> &'static str {
        "booking.book"
    }

    fn causation_id(&self) -> Uuid {
        self.causation_id
    }
}

impl Command for Cancel {
    fn command_type(&self) -> &'static str {
        "booking.cancel"
    }

    fn causation_id(&self) -> Uuid {
        self.causation_id
    }
}

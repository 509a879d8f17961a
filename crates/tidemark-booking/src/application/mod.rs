//! Application layer for the Booking context.

pub mod command_handlers;

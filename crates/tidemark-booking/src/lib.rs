//! Tidemark Booking — purchase-order booking context.
//!
//! A small bounded context that exercises the runtime end to end: a
//! `Booking` aggregate that books and cancels purchase-order references,
//! and command handlers that drive it through the repository.

pub mod application;
pub mod domain;

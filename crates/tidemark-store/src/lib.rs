//! Storage adapters for the Tidemark runtime.
//!
//! Two implementations of the [`tidemark_core::store`] boundaries: an
//! in-memory store for tests and embedded use, and a `PostgreSQL` store for
//! production.

pub mod memory;
pub mod postgres;
pub mod schema;

pub use memory::{InMemoryCursorStore, InMemoryEventStore};
pub use postgres::{PgCursorStore, PgEventStore};

//! Persistence layer: PostgreSQL event log and ticket snapshots.
//!
//! Durable storage is write-behind: the in-memory registry stays the
//! source of truth while a background task appends events and snapshots
//! tickets. On startup the latest snapshot per ticket can be restored
//! into the registry. The concrete implementation uses `sqlx::PgPool`
//! for async PostgreSQL access.

pub mod models;
pub mod postgres;

pub use models::{StoredEvent, TicketSnapshot};
pub use postgres::PostgresPersistence;

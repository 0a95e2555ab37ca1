//! Database models for events and snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored event row from the `ticket_events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Ticket that generated the event.
    pub ticket_id: Uuid,
    /// Event type discriminator (e.g. `"status_changed"`).
    pub event_type: String,
    /// JSONB payload with event-specific data.
    pub payload: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A ticket snapshot row from the `ticket_snapshots` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSnapshot {
    /// Auto-increment row ID.
    pub id: i64,
    /// Ticket that was snapshotted.
    pub ticket_id: Uuid,
    /// Lifecycle state at snapshot time, for cheap filtering.
    pub status: String,
    /// Full ticket state as JSONB.
    pub ticket_json: serde_json::Value,
    /// Snapshot timestamp.
    pub snapshot_at: DateTime<Utc>,
}

//! Domain events reflecting ticket state mutations.
//!
//! Every successful mutation publishes a [`TicketEvent`] through the
//! [`super::EventBus`]. The notification dispatcher consumes them to fan
//! out per-recipient notifications, and the persistence layer optionally
//! appends them to the PostgreSQL event log. Events carry everything a
//! consumer needs so dispatch never has to read the registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{TicketId, UserId};
use super::ticket::{Category, Criticality, TicketStatus};

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum TicketEvent {
    /// Emitted when a citizen files a new ticket.
    TicketCreated {
        /// Ticket identifier.
        ticket_id: TicketId,
        /// Owning citizen.
        author_id: UserId,
        /// Issue category.
        category: Category,
        /// Criticality tier assigned by the classifier.
        criticality: Criticality,
        /// Ward from the reported location, if known.
        ward: Option<String>,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after an authority-driven status transition.
    StatusChanged {
        /// Ticket identifier.
        ticket_id: TicketId,
        /// Ticket owner (notification recipient).
        owner_id: UserId,
        /// Authority who performed the transition.
        actor_id: UserId,
        /// Status before the transition.
        from: TicketStatus,
        /// Status after the transition.
        to: TicketStatus,
        /// Transition timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after the owner submits feedback on a proposed resolution.
    FeedbackSubmitted {
        /// Ticket identifier.
        ticket_id: TicketId,
        /// Ticket owner who submitted the verdict.
        owner_id: UserId,
        /// Authority assigned to the ticket, if any.
        assigned_to: Option<UserId>,
        /// Whether the owner confirmed the fix.
        approved: bool,
        /// Owner's comments (may be empty).
        comments: String,
        /// Submission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a successful upvote.
    Upvoted {
        /// Ticket identifier.
        ticket_id: TicketId,
        /// Ticket owner (notification recipient).
        owner_id: UserId,
        /// User who cast the vote.
        voter_id: UserId,
        /// Counter value after the increment.
        upvotes: u64,
        /// Vote timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl TicketEvent {
    /// Returns the ticket ID associated with this event.
    #[must_use]
    pub fn ticket_id(&self) -> TicketId {
        match self {
            Self::TicketCreated { ticket_id, .. }
            | Self::StatusChanged { ticket_id, .. }
            | Self::FeedbackSubmitted { ticket_id, .. }
            | Self::Upvoted { ticket_id, .. } => *ticket_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::TicketCreated { .. } => "ticket_created",
            Self::StatusChanged { .. } => "status_changed",
            Self::FeedbackSubmitted { .. } => "feedback_submitted",
            Self::Upvoted { .. } => "upvoted",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn event_type_strings() {
        let event = TicketEvent::TicketCreated {
            ticket_id: TicketId::new(),
            author_id: UserId::new(),
            category: Category::Pothole,
            criticality: Criticality::Low,
            ward: None,
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "ticket_created");
    }

    #[test]
    fn status_changed_serializes_wire_names() {
        let event = TicketEvent::StatusChanged {
            ticket_id: TicketId::new(),
            owner_id: UserId::new(),
            actor_id: UserId::new(),
            from: TicketStatus::Submitted,
            to: TicketStatus::InProgress,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("status_changed"));
        assert!(json.contains("in-progress"));
    }

    #[test]
    fn ticket_id_accessor() {
        let id = TicketId::new();
        let event = TicketEvent::Upvoted {
            ticket_id: id,
            owner_id: UserId::new(),
            voter_id: UserId::new(),
            upvotes: 3,
            timestamp: Utc::now(),
        };
        assert_eq!(event.ticket_id(), id);
    }
}

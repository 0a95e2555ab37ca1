//! Ticket aggregate and its lifecycle enums.
//!
//! The ticket status is a closed enum rather than a free-form string, so
//! the transition table in [`TicketStatus::authority_can_move_to`] is
//! exhaustively checked at compile time.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{TicketId, UserId};

/// Municipal issue category, fixed at ticket creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Road surface damage.
    Pothole,
    /// Drinking water distribution problems.
    WaterSupply,
    /// Blocked or overflowing drains.
    Drainage,
    /// Broken or dark street lighting.
    Streetlight,
    /// Garbage collection and dumping issues.
    GarbageManagement,
    /// Traffic signals, congestion, signage.
    Traffic,
    /// Noise complaints.
    NoisePollution,
    /// Power distribution problems.
    Electricity,
    /// Sewage leaks and backups.
    Sewage,
    /// Anything that does not fit the above.
    Other,
}

impl Category {
    /// Kebab-case wire representation of the category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pothole => "pothole",
            Self::WaterSupply => "water-supply",
            Self::Drainage => "drainage",
            Self::Streetlight => "streetlight",
            Self::GarbageManagement => "garbage-management",
            Self::Traffic => "traffic",
            Self::NoisePollution => "noise-pollution",
            Self::Electricity => "electricity",
            Self::Sewage => "sewage",
            Self::Other => "other",
        }
    }

    /// Categories whose outage degrades essential infrastructure even
    /// without alarming description text; these floor at Medium
    /// criticality in the classifier.
    #[must_use]
    pub const fn is_infrastructure_essential(&self) -> bool {
        matches!(self, Self::WaterSupply | Self::Electricity | Self::Sewage)
    }

    /// All known categories, for the catalog endpoint.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Pothole,
            Self::WaterSupply,
            Self::Drainage,
            Self::Streetlight,
            Self::GarbageManagement,
            Self::Traffic,
            Self::NoisePollution,
            Self::Electricity,
            Self::Sewage,
            Self::Other,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity tier assigned once at creation; drives the SLA deadline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    /// Routine issue, 7-day SLA.
    Low,
    /// Essential-infrastructure issue, 3-day SLA.
    Medium,
    /// Serious issue, 24-hour SLA.
    High,
    /// Emergency, 6-hour SLA.
    Critical,
}

impl Criticality {
    /// Snake-case wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a ticket.
///
/// Wire names match the reference system: `in-progress` is kebab-case
/// while `pending_feedback` is snake_case, so each variant carries an
/// explicit rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TicketStatus {
    /// Initial state after creation.
    #[serde(rename = "submitted")]
    Submitted,
    /// An authority has acknowledged the ticket.
    #[serde(rename = "in-progress")]
    InProgress,
    /// An authority proposed completion; awaiting citizen verification.
    #[serde(rename = "pending_feedback")]
    PendingFeedback,
    /// Citizen approved the resolution. Terminal success state.
    #[serde(rename = "completed")]
    Completed,
    /// Citizen rejected the resolution; back in authority hands.
    #[serde(rename = "reopened")]
    Reopened,
    /// Administratively closed (duplicate, invalid, ...). Terminal.
    #[serde(rename = "closed")]
    Closed,
}

impl TicketStatus {
    /// Wire representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::InProgress => "in-progress",
            Self::PendingFeedback => "pending_feedback",
            Self::Completed => "completed",
            Self::Reopened => "reopened",
            Self::Closed => "closed",
        }
    }

    /// `true` for states that still need attention from someone.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    /// `true` for the two terminal states.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Closed)
    }

    /// States for which the SLA evaluator reports live urgency.
    /// `Reopened` is deliberately excluded, matching the reference
    /// system's active set.
    #[must_use]
    pub const fn is_sla_active(&self) -> bool {
        matches!(self, Self::Submitted | Self::InProgress | Self::PendingFeedback)
    }

    /// Transition table for authority-driven moves.
    ///
    /// `Reopened` is operationally equivalent to `InProgress` as a
    /// source state. `Completed` and `Reopened` are never direct
    /// authority targets; they are only reachable through citizen
    /// feedback.
    #[must_use]
    pub const fn authority_can_move_to(&self, target: Self) -> bool {
        match target {
            Self::InProgress | Self::PendingFeedback => {
                matches!(self, Self::Submitted | Self::InProgress | Self::Reopened)
            }
            Self::Closed => self.is_open(),
            Self::Submitted | Self::Completed | Self::Reopened => false,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Citizen-verification sub-state, populated only around the feedback loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    /// Resolution proposed; waiting for the owner to verify.
    Pending,
    /// Owner confirmed the fix.
    Approved,
    /// Owner rejected the fix; ticket was reopened.
    Rejected,
}

/// Geographic position of the reported issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Administrative ward name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    /// Free-text street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A completion proposal recorded when an authority moves a ticket to
/// `pending_feedback`. Entries are append-only across reopen cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Resolution {
    /// Authority's notes describing the fix.
    pub notes: String,
    /// URL of photographic proof. Always non-empty; enforced before the
    /// transition commits.
    pub proof_image_url: String,
    /// Authority who proposed the resolution.
    pub resolved_by: UserId,
    /// When the resolution was proposed.
    pub resolved_at: DateTime<Utc>,
}

/// The owner's verdict on a proposed resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CitizenFeedback {
    /// Whether the owner confirmed the fix.
    pub approved: bool,
    /// Optional free-text comments.
    pub comments: String,
    /// When the feedback was submitted.
    pub submitted_at: DateTime<Utc>,
}

/// The central ticket aggregate.
///
/// `criticality` and `sla_deadline` are computed exactly once at
/// creation and never recalculated; `status` only moves along the
/// transition table enforced by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket identifier (immutable after creation).
    pub id: TicketId,
    /// Owning citizen (immutable after creation).
    pub author_id: UserId,
    /// Issue category (immutable after creation).
    pub category: Category,
    /// Free-text description, may be empty (immutable after creation).
    pub description: String,
    /// Where the issue was reported.
    pub location: Location,
    /// Severity tier computed at creation (immutable).
    pub criticality: Criticality,
    /// Absolute resolution deadline computed at creation (immutable).
    pub sla_deadline: DateTime<Utc>,
    /// Current lifecycle state.
    pub status: TicketStatus,
    /// Authority handling the ticket; set on first authority action.
    pub assigned_to: Option<UserId>,
    /// Append-only history of completion proposals. The last entry is
    /// the one currently (or most recently) under citizen review.
    pub resolutions: Vec<Resolution>,
    /// Citizen-verification sub-state; `Some` exactly while the
    /// feedback loop is live or after an approval.
    pub feedback_status: Option<FeedbackStatus>,
    /// The owner's most recent verdict, if any.
    pub citizen_feedback: Option<CitizenFeedback>,
    /// Community-priority counter; only ever increases.
    pub upvotes: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last mutation.
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Creates a freshly submitted ticket with precomputed criticality
    /// and SLA deadline.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TicketId,
        author_id: UserId,
        category: Category,
        description: String,
        location: Location,
        criticality: Criticality,
        sla_deadline: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author_id,
            category,
            description,
            location,
            criticality,
            sla_deadline,
            status: TicketStatus::Submitted,
            assigned_to: None,
            resolutions: Vec::new(),
            feedback_status: None,
            citizen_feedback: None,
            upvotes: 0,
            created_at,
            updated_at: created_at,
        }
    }

    /// The resolution currently (or most recently) under review, if any.
    #[must_use]
    pub fn current_resolution(&self) -> Option<&Resolution> {
        self.resolutions.last()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn authority_table_allows_acknowledge_and_propose() {
        for from in [
            TicketStatus::Submitted,
            TicketStatus::InProgress,
            TicketStatus::Reopened,
        ] {
            assert!(from.authority_can_move_to(TicketStatus::InProgress));
            assert!(from.authority_can_move_to(TicketStatus::PendingFeedback));
        }
    }

    #[test]
    fn authority_table_rejects_direct_completion() {
        assert!(!TicketStatus::Submitted.authority_can_move_to(TicketStatus::Completed));
        assert!(!TicketStatus::InProgress.authority_can_move_to(TicketStatus::Completed));
        assert!(!TicketStatus::PendingFeedback.authority_can_move_to(TicketStatus::Completed));
        assert!(!TicketStatus::InProgress.authority_can_move_to(TicketStatus::Reopened));
        assert!(!TicketStatus::InProgress.authority_can_move_to(TicketStatus::Submitted));
    }

    #[test]
    fn any_open_state_can_be_closed() {
        for from in [
            TicketStatus::Submitted,
            TicketStatus::InProgress,
            TicketStatus::PendingFeedback,
            TicketStatus::Reopened,
        ] {
            assert!(from.authority_can_move_to(TicketStatus::Closed));
        }
        assert!(!TicketStatus::Completed.authority_can_move_to(TicketStatus::Closed));
        assert!(!TicketStatus::Closed.authority_can_move_to(TicketStatus::Closed));
    }

    #[test]
    fn terminal_states_have_no_outgoing_transitions() {
        for from in [TicketStatus::Completed, TicketStatus::Closed] {
            for to in [
                TicketStatus::Submitted,
                TicketStatus::InProgress,
                TicketStatus::PendingFeedback,
                TicketStatus::Completed,
                TicketStatus::Reopened,
                TicketStatus::Closed,
            ] {
                assert!(!from.authority_can_move_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn sla_active_set_excludes_reopened() {
        assert!(TicketStatus::Submitted.is_sla_active());
        assert!(TicketStatus::InProgress.is_sla_active());
        assert!(TicketStatus::PendingFeedback.is_sla_active());
        assert!(!TicketStatus::Reopened.is_sla_active());
        assert!(!TicketStatus::Completed.is_sla_active());
        assert!(!TicketStatus::Closed.is_sla_active());
    }

    #[test]
    fn status_wire_names_match_reference() {
        let json = serde_json::to_string(&TicketStatus::InProgress).unwrap_or_default();
        assert_eq!(json, "\"in-progress\"");
        let json = serde_json::to_string(&TicketStatus::PendingFeedback).unwrap_or_default();
        assert_eq!(json, "\"pending_feedback\"");
    }

    #[test]
    fn category_wire_names_are_kebab_case() {
        let json = serde_json::to_string(&Category::WaterSupply).unwrap_or_default();
        assert_eq!(json, "\"water-supply\"");
        let parsed: Category =
            serde_json::from_str("\"garbage-management\"").ok().unwrap_or(Category::Other);
        assert_eq!(parsed, Category::GarbageManagement);
    }

    #[test]
    fn infrastructure_essential_set() {
        assert!(Category::WaterSupply.is_infrastructure_essential());
        assert!(Category::Electricity.is_infrastructure_essential());
        assert!(Category::Sewage.is_infrastructure_essential());
        assert!(!Category::Pothole.is_infrastructure_essential());
        assert!(!Category::Drainage.is_infrastructure_essential());
    }
}

//! Ticket-related DTOs for create, transition, feedback, upvote and
//! list operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::ids::{TicketId, UserId};
use crate::domain::sla::{self, SlaStatus};
use crate::domain::ticket::{
    Category, CitizenFeedback, Criticality, FeedbackStatus, Location, Resolution, Ticket,
    TicketStatus,
};
use crate::service::{ResolutionProposal, TicketSort};

/// Request body for `POST /tickets`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    /// Citizen filing the ticket.
    pub author_id: UserId,
    /// Issue category.
    pub category: Category,
    /// Free-text description; drives criticality classification.
    #[serde(default)]
    pub description: String,
    /// Where the issue was observed.
    pub location: Location,
}

/// Request body for `PUT /tickets/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionRequest {
    /// Authority performing the transition.
    pub actor_id: UserId,
    /// Target lifecycle state.
    pub status: TicketStatus,
    /// Completion proposal; required when moving to `pending_feedback`.
    #[serde(default)]
    pub resolution: Option<ResolutionProposal>,
}

/// Request body for `POST /tickets/{id}/feedback`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedbackRequest {
    /// The ticket owner submitting the verdict.
    pub citizen_id: UserId,
    /// Whether the resolution actually fixed the issue.
    pub approved: bool,
    /// Optional free-text remarks.
    #[serde(default)]
    pub comments: String,
}

/// Request body for `POST /tickets/{id}/upvote`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpvoteRequest {
    /// Voting user.
    pub user_id: UserId,
}

/// Response body for `POST /tickets/{id}/upvote`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UpvoteResponse {
    /// The upvoted ticket.
    pub ticket_id: TicketId,
    /// New total after this vote.
    pub upvotes: u64,
}

/// Filter and sort query parameters for `GET /tickets`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct TicketFilterParams {
    /// Only tickets in this status.
    pub status: Option<TicketStatus>,
    /// Only tickets in this category.
    pub category: Option<Category>,
    /// Only tickets reported in this ward.
    pub ward: Option<String>,
    /// Sort order. Defaults to newest first.
    #[serde(default)]
    pub sort: TicketSort,
}

/// Query parameter naming the acting user for authority-only reads.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ActorParams {
    /// User on whose behalf the request is made.
    pub actor_id: uuid::Uuid,
}

/// Full ticket view with live SLA fields, recomputed per request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketDto {
    /// Ticket identifier.
    pub id: TicketId,
    /// Owning citizen.
    pub author_id: UserId,
    /// Issue category.
    pub category: Category,
    /// Free-text description.
    pub description: String,
    /// Reported location.
    pub location: Location,
    /// Severity tier fixed at creation.
    pub criticality: Criticality,
    /// Absolute resolution deadline.
    pub sla_deadline: DateTime<Utc>,
    /// Live SLA bucket at response time.
    pub sla_status: SlaStatus,
    /// Live urgency score at response time; higher is more urgent.
    pub urgency_score: f64,
    /// Current lifecycle state.
    pub status: TicketStatus,
    /// Handling authority, if any.
    pub assigned_to: Option<UserId>,
    /// Completion proposals, oldest first.
    pub resolutions: Vec<Resolution>,
    /// Citizen-verification sub-state.
    pub feedback_status: Option<FeedbackStatus>,
    /// Most recent citizen verdict.
    pub citizen_feedback: Option<CitizenFeedback>,
    /// Community-priority counter.
    pub upvotes: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TicketDto {
    /// Projects a domain ticket into its wire form, evaluating the SLA
    /// against the given instant.
    #[must_use]
    pub fn from_ticket(ticket: Ticket, now: DateTime<Utc>) -> Self {
        let assessment = sla::evaluate(ticket.sla_deadline, ticket.status, now);
        Self {
            id: ticket.id,
            author_id: ticket.author_id,
            category: ticket.category,
            description: ticket.description,
            location: ticket.location,
            criticality: ticket.criticality,
            sla_deadline: ticket.sla_deadline,
            sla_status: assessment.status,
            urgency_score: assessment.score,
            status: ticket.status,
            assigned_to: ticket.assigned_to,
            resolutions: ticket.resolutions,
            feedback_status: ticket.feedback_status,
            citizen_feedback: ticket.citizen_feedback,
            upvotes: ticket.upvotes,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }
}

/// Paginated list response for `GET /tickets`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TicketListResponse {
    /// Ticket views in the requested order.
    pub data: Vec<TicketDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_ticket(status: TicketStatus) -> Ticket {
        let now = Utc::now();
        let mut ticket = Ticket::new(
            TicketId::new(),
            UserId::new(),
            Category::Streetlight,
            "lamp out".to_string(),
            Location {
                lat: 26.91,
                lng: 75.79,
                ward: None,
                address: None,
            },
            Criticality::Low,
            now + Duration::days(7),
            now,
        );
        ticket.status = status;
        ticket
    }

    #[test]
    fn dto_carries_live_sla_fields() {
        let ticket = make_ticket(TicketStatus::Submitted);
        let dto = TicketDto::from_ticket(ticket.clone(), ticket.created_at);
        assert_eq!(dto.sla_status, SlaStatus::Normal);
        assert!(dto.urgency_score > 0.0);
    }

    #[test]
    fn dto_reports_overdue_past_deadline() {
        let ticket = make_ticket(TicketStatus::InProgress);
        let after = ticket.sla_deadline + Duration::hours(1);
        let dto = TicketDto::from_ticket(ticket, after);
        assert_eq!(dto.sla_status, SlaStatus::Overdue);
        assert!((dto.urgency_score - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn dto_is_inert_for_closed_tickets() {
        let ticket = make_ticket(TicketStatus::Closed);
        let after = ticket.sla_deadline + Duration::days(30);
        let dto = TicketDto::from_ticket(ticket, after);
        assert_eq!(dto.sla_status, SlaStatus::Normal);
        assert!(dto.urgency_score.abs() < f64::EPSILON);
    }

    #[test]
    fn create_request_defaults_description() {
        let json = serde_json::json!({
            "author_id": uuid::Uuid::new_v4(),
            "category": "pothole",
            "location": {"lat": 26.91, "lng": 75.79}
        });
        let req: Result<CreateTicketRequest, _> = serde_json::from_value(json);
        let Ok(req) = req else {
            panic!("deserialization failed");
        };
        assert!(req.description.is_empty());
    }
}

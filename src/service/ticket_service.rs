//! Ticket service: orchestrates lifecycle operations and emits events.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::classifier;
use crate::domain::ids::{TicketId, UserId};
use crate::domain::sla::{self, SlaStatus};
use crate::domain::ticket::{
    Category, CitizenFeedback, Criticality, FeedbackStatus, Location, Resolution, Ticket,
    TicketStatus,
};
use crate::domain::user::Role;
use crate::domain::{
    EventBus, TicketEvent, TicketFilter, TicketRegistry, UpvoteLedger, UserDirectory,
};
use crate::error::GatewayError;

/// A completion proposal submitted by an authority alongside a move to
/// `pending_feedback`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResolutionProposal {
    /// What was done to fix the issue.
    pub notes: String,
    /// URL of the photographic proof. Must be non-empty.
    pub proof_image_url: String,
}

/// Sort orders for ticket listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketSort {
    /// Newest first.
    #[default]
    CreatedAt,
    /// Most upvoted first.
    Upvotes,
    /// Most severe first.
    Criticality,
    /// Highest urgency score first.
    Sla,
    /// Grouped by lifecycle state, in declaration order.
    Status,
}

/// Per-criticality slice of the SLA aggregate.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CriticalityBucket {
    /// Severity tier this bucket covers.
    pub criticality: Criticality,
    /// SLA-active tickets in the tier.
    pub total: usize,
    /// How many of them are past their deadline.
    pub overdue: usize,
}

/// Aggregate SLA health across all SLA-active tickets.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlaStats {
    /// Tickets currently carrying a live SLA clock.
    pub total_active: usize,
    /// Past-deadline tickets.
    pub overdue: usize,
    /// Tickets with two hours or less remaining.
    pub critical: usize,
    /// Tickets with a day or less remaining.
    pub warning: usize,
    /// Tickets comfortably within their deadline.
    pub on_time: usize,
    /// Breakdown by severity tier, most severe first.
    pub by_criticality: Vec<CriticalityBucket>,
}

/// Orchestration layer for all ticket operations.
///
/// Stateless coordinator: owns references to [`TicketRegistry`] for
/// state, [`UpvoteLedger`] for vote dedup, [`UserDirectory`] for role
/// checks and [`EventBus`] for event emission. Every mutation method
/// follows the pattern: acquire lock → validate → mutate → update
/// metadata → emit events → return result.
#[derive(Debug, Clone)]
pub struct TicketService {
    registry: Arc<TicketRegistry>,
    ledger: Arc<UpvoteLedger>,
    directory: Arc<UserDirectory>,
    event_bus: EventBus,
}

impl TicketService {
    /// Creates a new `TicketService`.
    #[must_use]
    pub fn new(
        registry: Arc<TicketRegistry>,
        ledger: Arc<UpvoteLedger>,
        directory: Arc<UserDirectory>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            registry,
            ledger,
            directory,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`TicketRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<TicketRegistry> {
        &self.registry
    }

    /// Files a new ticket: classifies it, stamps its SLA deadline and
    /// registers it in the `submitted` state.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the author is unknown.
    pub async fn create_ticket(
        &self,
        author_id: UserId,
        category: Category,
        description: String,
        location: Location,
    ) -> Result<Ticket, GatewayError> {
        self.directory.get(author_id).await?;

        let now = Utc::now();
        let criticality = classifier::classify(category, &description);
        let sla_deadline = sla::deadline_for(criticality, now);
        let ticket = Ticket::new(
            TicketId::new(),
            author_id,
            category,
            description,
            location,
            criticality,
            sla_deadline,
            now,
        );
        let ward = ticket.location.ward.clone();
        let ticket_id = self.registry.insert(ticket.clone()).await?;

        let _ = self.event_bus.publish(TicketEvent::TicketCreated {
            ticket_id,
            author_id,
            category,
            criticality,
            ward,
            timestamp: now,
        });

        tracing::info!(%ticket_id, category = category.as_str(), criticality = criticality.as_str(), "ticket created");
        Ok(ticket)
    }

    /// Returns a snapshot of a single ticket.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TicketNotFound`] for unknown tickets.
    pub async fn get_ticket(&self, ticket_id: TicketId) -> Result<Ticket, GatewayError> {
        let entry = self.registry.get(ticket_id).await?;
        let ticket = entry.read().await;
        Ok(ticket.clone())
    }

    /// Moves a ticket to a new state on behalf of an authority.
    ///
    /// Moving to `pending_feedback` is a completion proposal and
    /// requires a [`ResolutionProposal`] with photographic proof; the
    /// proposal is appended to the resolution history and the citizen
    /// feedback loop is armed. Closing a ticket clears any live
    /// feedback loop.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Forbidden`] when the actor is not an
    /// authority, [`GatewayError::InvalidTransition`] when the state
    /// machine forbids the move and [`GatewayError::ProofRequired`]
    /// when a completion proposal lacks proof.
    pub async fn transition_status(
        &self,
        ticket_id: TicketId,
        actor_id: UserId,
        target: TicketStatus,
        proposal: Option<ResolutionProposal>,
    ) -> Result<Ticket, GatewayError> {
        if self.directory.role_of(actor_id).await? != Role::Authority {
            return Err(GatewayError::Forbidden(
                "only authorities can change ticket status".to_string(),
            ));
        }

        let entry = self.registry.get(ticket_id).await?;
        let mut ticket = entry.write().await;

        let from = ticket.status;
        if !from.authority_can_move_to(target) {
            return Err(GatewayError::InvalidTransition { from, to: target });
        }

        let now = Utc::now();
        if target == TicketStatus::PendingFeedback {
            let Some(proposal) = proposal else {
                return Err(GatewayError::ProofRequired);
            };
            if proposal.proof_image_url.trim().is_empty() {
                return Err(GatewayError::ProofRequired);
            }
            ticket.resolutions.push(Resolution {
                notes: proposal.notes,
                proof_image_url: proposal.proof_image_url,
                resolved_by: actor_id,
                resolved_at: now,
            });
            ticket.feedback_status = Some(FeedbackStatus::Pending);
        }
        if target == TicketStatus::InProgress {
            // Rework retires a rejected verdict carried over from Reopened.
            ticket.feedback_status = None;
        }
        if target == TicketStatus::Closed {
            // Administrative close abandons any live feedback loop.
            ticket.feedback_status = None;
        }

        ticket.status = target;
        ticket.assigned_to = Some(actor_id);
        ticket.updated_at = now;

        let owner_id = ticket.author_id;
        let snapshot = ticket.clone();
        drop(ticket);

        let _ = self.event_bus.publish(TicketEvent::StatusChanged {
            ticket_id,
            owner_id,
            actor_id,
            from,
            to: target,
            timestamp: now,
        });

        tracing::info!(%ticket_id, from = from.as_str(), to = target.as_str(), "ticket status changed");
        Ok(snapshot)
    }

    /// Records the owning citizen's verdict on a completion proposal.
    ///
    /// Approval completes the ticket; rejection reopens it for further
    /// work. Either way the verdict is stored and the feedback loop is
    /// resolved.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Forbidden`] when the caller does not own
    /// the ticket and [`GatewayError::NotAwaitingFeedback`] when no
    /// proposal is pending.
    pub async fn submit_feedback(
        &self,
        ticket_id: TicketId,
        citizen_id: UserId,
        approved: bool,
        comments: String,
    ) -> Result<Ticket, GatewayError> {
        let entry = self.registry.get(ticket_id).await?;
        let mut ticket = entry.write().await;

        if ticket.author_id != citizen_id {
            return Err(GatewayError::Forbidden(
                "only the ticket owner can verify a resolution".to_string(),
            ));
        }
        if ticket.status != TicketStatus::PendingFeedback
            || ticket.feedback_status != Some(FeedbackStatus::Pending)
        {
            return Err(GatewayError::NotAwaitingFeedback);
        }

        let now = Utc::now();
        if approved {
            ticket.status = TicketStatus::Completed;
            ticket.feedback_status = Some(FeedbackStatus::Approved);
        } else {
            ticket.status = TicketStatus::Reopened;
            ticket.feedback_status = Some(FeedbackStatus::Rejected);
        }
        ticket.citizen_feedback = Some(CitizenFeedback {
            approved,
            comments: comments.clone(),
            submitted_at: now,
        });
        ticket.updated_at = now;

        let assigned_to = ticket.assigned_to;
        let snapshot = ticket.clone();
        drop(ticket);

        let _ = self.event_bus.publish(TicketEvent::FeedbackSubmitted {
            ticket_id,
            owner_id: citizen_id,
            assigned_to,
            approved,
            comments,
            timestamp: now,
        });

        tracing::info!(%ticket_id, approved, "citizen feedback recorded");
        Ok(snapshot)
    }

    /// Registers one upvote from a user on a ticket.
    ///
    /// Each user may upvote a given ticket at most once, ever; the
    /// counter never decreases.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AlreadyUpvoted`] on a repeat vote and
    /// [`GatewayError::TicketNotFound`] / [`GatewayError::UserNotFound`]
    /// for unknown ids.
    pub async fn upvote(
        &self,
        ticket_id: TicketId,
        voter_id: UserId,
    ) -> Result<u64, GatewayError> {
        self.directory.get(voter_id).await?;
        let entry = self.registry.get(ticket_id).await?;

        // The ledger insert is the atomic dedup point; the counter
        // increment below only ever runs once per (ticket, voter).
        self.ledger.record(ticket_id, voter_id).await?;

        let mut ticket = entry.write().await;
        let now = Utc::now();
        ticket.upvotes = ticket.upvotes.saturating_add(1);
        ticket.updated_at = now;

        let owner_id = ticket.author_id;
        let upvotes = ticket.upvotes;
        drop(ticket);

        let _ = self.event_bus.publish(TicketEvent::Upvoted {
            ticket_id,
            owner_id,
            voter_id,
            upvotes,
            timestamp: now,
        });

        Ok(upvotes)
    }

    /// Returns tickets matching the filter, ordered by the given sort.
    pub async fn list_tickets(&self, filter: &TicketFilter, sort: TicketSort) -> Vec<Ticket> {
        let mut tickets = self.registry.list(filter).await;
        let now = Utc::now();
        match sort {
            TicketSort::CreatedAt => {
                tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
            TicketSort::Upvotes => {
                tickets.sort_by(|a, b| b.upvotes.cmp(&a.upvotes));
            }
            TicketSort::Criticality => {
                tickets.sort_by(|a, b| b.criticality.cmp(&a.criticality));
            }
            TicketSort::Sla => {
                tickets.sort_by(|a, b| {
                    let sa = sla::evaluate(a.sla_deadline, a.status, now).score;
                    let sb = sla::evaluate(b.sla_deadline, b.status, now).score;
                    sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            TicketSort::Status => {
                tickets.sort_by_key(|t| t.status.as_str());
            }
        }
        tickets
    }

    /// Aggregates SLA health across every SLA-active ticket.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Forbidden`] when the caller is not an
    /// authority.
    pub async fn sla_stats(&self, actor_id: UserId) -> Result<SlaStats, GatewayError> {
        if self.directory.role_of(actor_id).await? != Role::Authority {
            return Err(GatewayError::Forbidden(
                "only authorities can view SLA statistics".to_string(),
            ));
        }

        let now = Utc::now();
        let mut stats = SlaStats {
            total_active: 0,
            overdue: 0,
            critical: 0,
            warning: 0,
            on_time: 0,
            by_criticality: [
                Criticality::Critical,
                Criticality::High,
                Criticality::Medium,
                Criticality::Low,
            ]
            .iter()
            .map(|&criticality| CriticalityBucket {
                criticality,
                total: 0,
                overdue: 0,
            })
            .collect(),
        };

        for ticket in self.registry.list(&TicketFilter::default()).await {
            if !ticket.status.is_sla_active() {
                continue;
            }
            stats.total_active += 1;
            let assessment = sla::evaluate(ticket.sla_deadline, ticket.status, now);
            match assessment.status {
                SlaStatus::Overdue => stats.overdue += 1,
                SlaStatus::Critical => stats.critical += 1,
                SlaStatus::Warning => stats.warning += 1,
                SlaStatus::Normal => stats.on_time += 1,
            }
            if let Some(bucket) = stats
                .by_criticality
                .iter_mut()
                .find(|b| b.criticality == ticket.criticality)
            {
                bucket.total += 1;
                if assessment.status == SlaStatus::Overdue {
                    bucket.overdue += 1;
                }
            }
        }

        Ok(stats)
    }
}

//! Event-driven notification fan-out.
//!
//! The dispatcher holds a broadcast receiver on the [`EventBus`] and
//! turns each [`TicketEvent`] into per-recipient notifications. It runs
//! decoupled from the mutation path: a failed or skipped notification is
//! logged and swallowed, never propagated back to the state transition
//! that caused it.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::notification::{Notification, NotificationFeed, NotificationKind};
use crate::domain::ids::UserId;
use crate::domain::ticket::TicketStatus;
use crate::domain::{EventBus, TicketEvent, UserDirectory};

/// Maps domain events to notification feed writes.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    feed: Arc<NotificationFeed>,
    directory: Arc<UserDirectory>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher writing to the given feed store.
    #[must_use]
    pub fn new(feed: Arc<NotificationFeed>, directory: Arc<UserDirectory>) -> Self {
        Self { feed, directory }
    }

    /// Subscribes to the bus and processes events until it closes.
    ///
    /// Lagged receivers log a warning and keep going; the dropped events
    /// are lost, which is acceptable for a best-effort feed.
    pub async fn run(self, bus: EventBus) {
        let mut rx = bus.subscribe();
        loop {
            match rx.recv().await {
                Ok(event) => self.handle_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "notification dispatcher lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("notification dispatcher stopped");
    }

    /// Processes a single event, writing all resulting notifications.
    pub async fn handle_event(&self, event: &TicketEvent) {
        match event {
            TicketEvent::TicketCreated {
                ticket_id,
                category,
                ward,
                ..
            } => {
                let area = ward.as_deref().unwrap_or("your area");
                let message = format!(
                    "A new {} issue has been reported in {area}",
                    category.as_str().replace('-', " ")
                );
                for authority in self.directory.authorities().await {
                    self.feed
                        .push(Notification::new(
                            authority,
                            NotificationKind::NewTicket,
                            "New Issue Reported",
                            message.clone(),
                            Some(*ticket_id),
                        ))
                        .await;
                }
            }

            TicketEvent::StatusChanged {
                ticket_id,
                owner_id,
                to,
                ..
            } => {
                if !self.recipient_known(*owner_id).await {
                    return;
                }
                let status_message = match to {
                    TicketStatus::PendingFeedback => "marked as resolved".to_string(),
                    other => other.as_str().replace('-', " "),
                };
                self.feed
                    .push(Notification::new(
                        *owner_id,
                        NotificationKind::TicketUpdate,
                        "Ticket Status Updated",
                        format!("Your ticket #{ticket_id} has been {status_message}"),
                        Some(*ticket_id),
                    ))
                    .await;

                // A proposed resolution additionally asks the owner to verify it.
                if *to == TicketStatus::PendingFeedback {
                    self.feed
                        .push(Notification::new(
                            *owner_id,
                            NotificationKind::Resolution,
                            "Please Verify Resolution",
                            format!(
                                "Your ticket #{ticket_id} has been marked as resolved. \
                                 Please review and confirm if the issue is actually fixed."
                            ),
                            Some(*ticket_id),
                        ))
                        .await;
                }
            }

            TicketEvent::FeedbackSubmitted {
                ticket_id,
                assigned_to,
                approved,
                comments,
                ..
            } => {
                let Some(authority) = assigned_to else {
                    tracing::warn!(%ticket_id, "feedback on unassigned ticket; nobody to notify");
                    return;
                };
                if !self.recipient_known(*authority).await {
                    return;
                }
                let verdict = if *approved { "approved" } else { "rejected" };
                let mut message =
                    format!("User has {verdict} the resolution for ticket #{ticket_id}");
                if !comments.is_empty() {
                    message.push_str(": ");
                    message.push_str(comments);
                }
                self.feed
                    .push(Notification::new(
                        *authority,
                        NotificationKind::UserFeedback,
                        format!("User {verdict} resolution"),
                        message,
                        Some(*ticket_id),
                    ))
                    .await;
            }

            TicketEvent::Upvoted {
                ticket_id,
                owner_id,
                voter_id,
                upvotes,
                ..
            } => {
                // Voting on your own ticket does not notify yourself.
                if voter_id == owner_id || !self.recipient_known(*owner_id).await {
                    return;
                }
                self.feed
                    .push(Notification::new(
                        *owner_id,
                        NotificationKind::TicketUpvote,
                        "Your Issue Got Support",
                        format!(
                            "Someone upvoted your ticket #{ticket_id}. Total votes: {upvotes}"
                        ),
                        Some(*ticket_id),
                    ))
                    .await;
            }
        }
    }

    async fn recipient_known(&self, user_id: UserId) -> bool {
        if self.directory.get(user_id).await.is_ok() {
            true
        } else {
            tracing::warn!(%user_id, "skipping notification for unknown recipient");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::TicketId;
    use crate::domain::ticket::{Category, Criticality};
    use crate::domain::user::{Role, UserProfile};
    use chrono::Utc;

    fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: UserId::new(),
            name: "fixture".to_string(),
            role,
        }
    }

    fn dispatcher_with(
        profiles: Vec<UserProfile>,
    ) -> (NotificationDispatcher, Arc<NotificationFeed>) {
        let feed = Arc::new(NotificationFeed::new());
        let directory = Arc::new(UserDirectory::from_fixtures(profiles));
        (
            NotificationDispatcher::new(Arc::clone(&feed), directory),
            feed,
        )
    }

    #[tokio::test]
    async fn ticket_created_notifies_every_authority() {
        let auth_a = profile(Role::Authority);
        let auth_b = profile(Role::Authority);
        let citizen = profile(Role::Citizen);
        let (a, b, c) = (auth_a.id, auth_b.id, citizen.id);
        let (dispatcher, feed) = dispatcher_with(vec![auth_a, auth_b, citizen]);

        dispatcher
            .handle_event(&TicketEvent::TicketCreated {
                ticket_id: TicketId::new(),
                author_id: c,
                category: Category::WaterSupply,
                criticality: Criticality::Medium,
                ward: Some("C-Scheme".to_string()),
                timestamp: Utc::now(),
            })
            .await;

        assert_eq!(feed.list(a).await.len(), 1);
        assert_eq!(feed.list(b).await.len(), 1);
        assert!(feed.list(c).await.is_empty());

        let note = feed.list(a).await.into_iter().next();
        let Some(note) = note else {
            panic!("expected a notification");
        };
        assert_eq!(note.kind, NotificationKind::NewTicket);
        assert!(note.message.contains("water supply"));
        assert!(note.message.contains("C-Scheme"));
    }

    #[tokio::test]
    async fn status_change_notifies_owner() {
        let owner = profile(Role::Citizen);
        let owner_id = owner.id;
        let (dispatcher, feed) = dispatcher_with(vec![owner]);

        dispatcher
            .handle_event(&TicketEvent::StatusChanged {
                ticket_id: TicketId::new(),
                owner_id,
                actor_id: UserId::new(),
                from: TicketStatus::Submitted,
                to: TicketStatus::InProgress,
                timestamp: Utc::now(),
            })
            .await;

        let list = feed.list(owner_id).await;
        assert_eq!(list.len(), 1);
        assert!(list.iter().all(|n| n.kind == NotificationKind::TicketUpdate));
    }

    #[tokio::test]
    async fn pending_feedback_adds_verification_request() {
        let owner = profile(Role::Citizen);
        let owner_id = owner.id;
        let (dispatcher, feed) = dispatcher_with(vec![owner]);

        dispatcher
            .handle_event(&TicketEvent::StatusChanged {
                ticket_id: TicketId::new(),
                owner_id,
                actor_id: UserId::new(),
                from: TicketStatus::InProgress,
                to: TicketStatus::PendingFeedback,
                timestamp: Utc::now(),
            })
            .await;

        let list = feed.list(owner_id).await;
        assert_eq!(list.len(), 2);
        assert!(list.iter().any(|n| n.kind == NotificationKind::Resolution));
        assert!(list.iter().any(|n| n.kind == NotificationKind::TicketUpdate));
    }

    #[tokio::test]
    async fn feedback_notifies_assigned_authority() {
        let authority = profile(Role::Authority);
        let authority_id = authority.id;
        let (dispatcher, feed) = dispatcher_with(vec![authority]);

        dispatcher
            .handle_event(&TicketEvent::FeedbackSubmitted {
                ticket_id: TicketId::new(),
                owner_id: UserId::new(),
                assigned_to: Some(authority_id),
                approved: false,
                comments: "still broken".to_string(),
                timestamp: Utc::now(),
            })
            .await;

        let list = feed.list(authority_id).await;
        assert_eq!(list.len(), 1);
        let Some(note) = list.into_iter().next() else {
            panic!("expected a notification");
        };
        assert_eq!(note.kind, NotificationKind::UserFeedback);
        assert!(note.message.contains("rejected"));
        assert!(note.message.contains("still broken"));
    }

    #[tokio::test]
    async fn self_upvote_is_not_notified() {
        let owner = profile(Role::Citizen);
        let owner_id = owner.id;
        let (dispatcher, feed) = dispatcher_with(vec![owner]);

        dispatcher
            .handle_event(&TicketEvent::Upvoted {
                ticket_id: TicketId::new(),
                owner_id,
                voter_id: owner_id,
                upvotes: 1,
                timestamp: Utc::now(),
            })
            .await;

        assert!(feed.list(owner_id).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_recipient_is_skipped_silently() {
        let (dispatcher, feed) = dispatcher_with(vec![]);
        let ghost = UserId::new();

        dispatcher
            .handle_event(&TicketEvent::StatusChanged {
                ticket_id: TicketId::new(),
                owner_id: ghost,
                actor_id: UserId::new(),
                from: TicketStatus::Submitted,
                to: TicketStatus::Closed,
                timestamp: Utc::now(),
            })
            .await;

        assert!(feed.list(ghost).await.is_empty());
    }

    #[tokio::test]
    async fn run_loop_consumes_bus_events() {
        let owner = profile(Role::Citizen);
        let owner_id = owner.id;
        let voter = profile(Role::Citizen);
        let voter_id = voter.id;
        let (dispatcher, feed) = dispatcher_with(vec![owner, voter]);

        let bus = EventBus::new(16);
        let handle = tokio::spawn(dispatcher.run(bus.clone()));

        // Give the task a moment to subscribe before publishing.
        tokio::task::yield_now().await;
        while bus.receiver_count() == 0 {
            tokio::task::yield_now().await;
        }

        bus.publish(TicketEvent::Upvoted {
            ticket_id: TicketId::new(),
            owner_id,
            voter_id,
            upvotes: 1,
            timestamp: Utc::now(),
        });

        // Wait for the dispatcher to drain the event.
        for _ in 0..100 {
            if !feed.list(owner_id).await.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(feed.list(owner_id).await.len(), 1);
        handle.abort();
    }
}

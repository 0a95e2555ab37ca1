//! Notification records and the capped per-recipient feed.
//!
//! Each recipient's feed is a newest-first deque capped at
//! [`FEED_CAP`] entries; pushing to a full feed evicts the oldest
//! entry (FIFO). Notifications are only ever mutated by marking them
//! read.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::domain::ids::{TicketId, UserId};
use crate::error::GatewayError;

/// Maximum retained notifications per recipient.
pub const FEED_CAP: usize = 50;

/// Kind of notification, matching the reference system's type strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A new ticket was filed (sent to authorities).
    NewTicket,
    /// An authority moved the ticket (sent to the owner).
    TicketUpdate,
    /// Someone upvoted the ticket (sent to the owner).
    TicketUpvote,
    /// The owner submitted a verdict (sent to the assigned authority).
    UserFeedback,
    /// A resolution awaits the owner's verification.
    Resolution,
}

/// A single per-recipient notification.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Notification {
    /// Notification identifier, unique within the recipient's feed.
    pub id: uuid::Uuid,
    /// Recipient user.
    pub recipient_id: UserId,
    /// What happened.
    pub kind: NotificationKind,
    /// Short title.
    pub title: String,
    /// Human-readable message.
    pub message: String,
    /// Ticket the notification refers to, if any.
    pub ticket_id: Option<TicketId>,
    /// Whether the recipient has seen it.
    pub read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Builds an unread notification stamped with the current time.
    #[must_use]
    pub fn new(
        recipient_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        ticket_id: Option<TicketId>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            recipient_id,
            kind,
            title: title.into(),
            message: message.into(),
            ticket_id,
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Per-recipient notification feeds, newest-first, capped at [`FEED_CAP`].
#[derive(Debug, Default)]
pub struct NotificationFeed {
    feeds: RwLock<HashMap<UserId, VecDeque<Notification>>>,
}

impl NotificationFeed {
    /// Creates an empty feed store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends a notification to its recipient's feed, evicting the
    /// oldest entry when the feed is full.
    pub async fn push(&self, notification: Notification) {
        let mut feeds = self.feeds.write().await;
        let feed = feeds.entry(notification.recipient_id).or_default();
        feed.push_front(notification);
        feed.truncate(FEED_CAP);
    }

    /// Returns the recipient's feed, newest first.
    pub async fn list(&self, user_id: UserId) -> Vec<Notification> {
        self.feeds
            .read()
            .await
            .get(&user_id)
            .map(|feed| feed.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Marks a single notification as read.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotificationNotFound`] if the recipient's
    /// feed does not contain the notification.
    pub async fn mark_read(
        &self,
        user_id: UserId,
        notification_id: uuid::Uuid,
    ) -> Result<(), GatewayError> {
        let mut feeds = self.feeds.write().await;
        let notification = feeds
            .get_mut(&user_id)
            .and_then(|feed| feed.iter_mut().find(|n| n.id == notification_id))
            .ok_or(GatewayError::NotificationNotFound(notification_id))?;
        notification.read = true;
        Ok(())
    }

    /// Marks every notification in the recipient's feed as read.
    pub async fn mark_all_read(&self, user_id: UserId) {
        let mut feeds = self.feeds.write().await;
        if let Some(feed) = feeds.get_mut(&user_id) {
            for notification in feed.iter_mut() {
                notification.read = true;
            }
        }
    }

    /// Number of unread notifications in the recipient's feed.
    pub async fn unread_count(&self, user_id: UserId) -> usize {
        self.feeds
            .read()
            .await
            .get(&user_id)
            .map(|feed| feed.iter().filter(|n| !n.read).count())
            .unwrap_or(0)
    }
}

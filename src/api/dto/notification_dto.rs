//! Notification feed DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::notify::Notification;

/// Response body for `GET /users/{id}/notifications`.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationListResponse {
    /// Notifications, newest first, capped at the feed size.
    pub data: Vec<Notification>,
    /// How many of them are unread.
    pub unread_count: usize,
}

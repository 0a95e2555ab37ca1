//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::{EventBus, UserDirectory};
use crate::notify::NotificationFeed;
use crate::service::TicketService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Ticket service for all lifecycle business logic.
    pub ticket_service: Arc<TicketService>,
    /// Per-user notification feeds, written by the dispatcher task.
    pub notification_feed: Arc<NotificationFeed>,
    /// User directory for roles and fan-out targets.
    pub directory: Arc<UserDirectory>,
    /// Event bus carrying all ticket lifecycle events.
    pub event_bus: EventBus,
}

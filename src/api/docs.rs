//! OpenAPI document aggregation for the REST surface.

use utoipa::OpenApi;

use super::handlers::{notification, system, ticket};

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        ticket::create_ticket,
        ticket::list_tickets,
        ticket::get_ticket,
        ticket::transition_status,
        ticket::submit_feedback,
        ticket::upvote_ticket,
        ticket::sla_stats,
        notification::list_notifications,
        notification::mark_notification_read,
        notification::mark_all_notifications_read,
        system::health_handler,
        system::categories_handler,
    ),
    tags(
        (name = "Tickets", description = "Ticket lifecycle, SLA and upvotes"),
        (name = "Notifications", description = "Per-user notification feeds"),
        (name = "System", description = "Health and static catalogs"),
    ),
    info(
        title = "civic-gateway",
        description = "REST gateway for civic-issue ticket lifecycle, SLA tracking and notifications."
    )
)]
pub struct ApiDoc;

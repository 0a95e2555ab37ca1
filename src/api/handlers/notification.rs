//! Notification feed handlers: list, mark read, mark all read.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::NotificationListResponse;
use crate::app_state::AppState;
use crate::domain::ids::UserId;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /users/:id/notifications` — Read a user's notification feed.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/notifications",
    tag = "Notifications",
    summary = "List notifications",
    description = "Returns the user's notification feed, newest first, capped at the feed size. Unknown users simply have an empty feed.",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Notification feed", body = NotificationListResponse),
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = UserId::from_uuid(id);
    let data = state.notification_feed.list(user_id).await;
    let unread_count = data.iter().filter(|n| !n.read).count();
    Ok(Json(NotificationListResponse { data, unread_count }))
}

/// `PUT /users/:id/notifications/:notification_id/read` — Mark one
/// notification as read.
///
/// # Errors
///
/// Returns [`GatewayError::NotificationNotFound`] if the notification
/// is not in the user's feed.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/notifications/{notification_id}/read",
    tag = "Notifications",
    summary = "Mark a notification read",
    description = "Marks a single notification in the user's feed as read. Idempotent.",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
        ("notification_id" = uuid::Uuid, Path, description = "Notification UUID"),
    ),
    responses(
        (status = 204, description = "Notification marked read"),
        (status = 404, description = "Notification not found in this user's feed", body = ErrorResponse),
    )
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path((id, notification_id)): Path<(uuid::Uuid, uuid::Uuid)>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .notification_feed
        .mark_read(UserId::from_uuid(id), notification_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /users/:id/notifications/read-all` — Mark the whole feed read.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/notifications/read-all",
    tag = "Notifications",
    summary = "Mark all notifications read",
    description = "Marks every notification in the user's feed as read. Idempotent; a missing feed is a no-op.",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 204, description = "Feed marked read"),
    )
)]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .notification_feed
        .mark_all_read(UserId::from_uuid(id))
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// Notification feed routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/notifications", get(list_notifications))
        .route(
            "/users/{id}/notifications/read-all",
            put(mark_all_notifications_read),
        )
        .route(
            "/users/{id}/notifications/{notification_id}/read",
            put(mark_notification_read),
        )
}

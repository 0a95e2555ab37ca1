//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ticket::TicketStatus;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4003,
///     "message": "proof of resolution is required to enter pending_feedback",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                  |
/// |-----------|-------------------|------------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request              |
/// | 2000–2999 | Not Found         | 404 Not Found                |
/// | 3000–3999 | Server            | 500 / 503                    |
/// | 4000–4999 | Lifecycle Rules   | 403 / 409 / 422              |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Ticket with the given ID was not found.
    #[error("ticket not found: {0}")]
    TicketNotFound(uuid::Uuid),

    /// User with the given ID is not known to the directory.
    #[error("user not found: {0}")]
    UserNotFound(uuid::Uuid),

    /// Notification with the given ID was not found in the recipient's feed.
    #[error("notification not found: {0}")]
    NotificationNotFound(uuid::Uuid),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Actor lacks the role or ownership required for the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The target status is not reachable from the current one.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// Status the ticket is currently in.
        from: TicketStatus,
        /// Status the actor attempted to move to.
        to: TicketStatus,
    },

    /// Entering `pending_feedback` requires a resolution with proof.
    #[error("proof of resolution is required to enter pending_feedback")]
    ProofRequired,

    /// Feedback submitted while the ticket is not awaiting any.
    #[error("ticket is not awaiting feedback")]
    NotAwaitingFeedback,

    /// The (ticket, user) pair already has an upvote record.
    #[error("ticket {0} already upvoted by this user")]
    AlreadyUpvoted(uuid::Uuid),

    /// Persistence layer failure; callers may retry.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::TicketNotFound(_) => 2001,
            Self::UserNotFound(_) => 2002,
            Self::NotificationNotFound(_) => 2003,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::Forbidden(_) => 4001,
            Self::InvalidTransition { .. } => 4002,
            Self::ProofRequired => 4003,
            Self::NotAwaitingFeedback => 4004,
            Self::AlreadyUpvoted(_) => 4005,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::TicketNotFound(_) | Self::UserNotFound(_) | Self::NotificationNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidTransition { .. } | Self::NotAwaitingFeedback | Self::AlreadyUpvoted(_) => {
                StatusCode::CONFLICT
            }
            Self::ProofRequired => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PersistenceError(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

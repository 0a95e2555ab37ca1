//! Ticket lifecycle handlers: create, list, get, transition, feedback,
//! upvote and SLA statistics.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    ActorParams, CreateTicketRequest, FeedbackRequest, PaginationMeta, PaginationParams,
    TicketDto, TicketFilterParams, TicketListResponse, TransitionRequest, UpvoteRequest,
    UpvoteResponse,
};
use crate::app_state::AppState;
use crate::domain::TicketFilter;
use crate::domain::ids::{TicketId, UserId};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::SlaStats;

/// `POST /tickets` — File a new civic issue ticket.
///
/// # Errors
///
/// Returns [`GatewayError`] if the author is unknown.
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    tag = "Tickets",
    summary = "File a new ticket",
    description = "Creates a ticket in the `submitted` state. Criticality is classified from the description and category, and the SLA deadline is stamped from the criticality tier.",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = TicketDto),
        (status = 404, description = "Unknown author", body = ErrorResponse),
    )
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let ticket = state
        .ticket_service
        .create_ticket(req.author_id, req.category, req.description, req.location)
        .await?;

    let dto = TicketDto::from_ticket(ticket, Utc::now());
    Ok((StatusCode::CREATED, Json(dto)))
}

/// `GET /tickets` — List tickets with filters, sorting and pagination.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    tag = "Tickets",
    summary = "List tickets",
    description = "Returns a paginated ticket list. SLA status and urgency score are evaluated live against the request time.",
    params(TicketFilterParams, PaginationParams),
    responses(
        (status = 200, description = "Paginated ticket list", body = TicketListResponse),
    )
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    Query(filter): Query<TicketFilterParams>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let pagination = pagination.clamped();
    let domain_filter = TicketFilter {
        status: filter.status,
        category: filter.category,
        ward: filter.ward,
    };
    let tickets = state
        .ticket_service
        .list_tickets(&domain_filter, filter.sort)
        .await;

    let now = Utc::now();
    let total = tickets.len() as u32;
    let per_page = pagination.per_page;
    let page = pagination.page;
    let total_pages = if total == 0 {
        0
    } else {
        total.div_ceil(per_page)
    };

    let data: Vec<TicketDto> = tickets
        .into_iter()
        .skip(pagination.offset())
        .take(per_page as usize)
        .map(|t| TicketDto::from_ticket(t, now))
        .collect();

    Ok(Json(TicketListResponse {
        data,
        pagination: PaginationMeta {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// `GET /tickets/:id` — Get a single ticket with live SLA fields.
///
/// # Errors
///
/// Returns [`GatewayError::TicketNotFound`] if the ticket does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}",
    tag = "Tickets",
    summary = "Get ticket details",
    description = "Returns the full ticket including resolution history, feedback state and live SLA evaluation.",
    params(
        ("id" = uuid::Uuid, Path, description = "Ticket UUID"),
    ),
    responses(
        (status = 200, description = "Ticket details", body = TicketDto),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    )
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let ticket = state
        .ticket_service
        .get_ticket(TicketId::from_uuid(id))
        .await?;
    Ok(Json(TicketDto::from_ticket(ticket, Utc::now())))
}

/// `PUT /tickets/:id/status` — Move a ticket to a new lifecycle state.
///
/// # Errors
///
/// Returns [`GatewayError`] when the actor lacks the authority role,
/// the transition is forbidden, or a completion proposal lacks proof.
#[utoipa::path(
    put,
    path = "/api/v1/tickets/{id}/status",
    tag = "Tickets",
    summary = "Change ticket status",
    description = "Authority-only. Moving to `pending_feedback` proposes a completion and requires a resolution with photographic proof; moving to `closed` abandons any live feedback loop.",
    params(
        ("id" = uuid::Uuid, Path, description = "Ticket UUID"),
    ),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Updated ticket", body = TicketDto),
        (status = 403, description = "Actor is not an authority", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed from the current state", body = ErrorResponse),
        (status = 422, description = "Completion proposal lacks proof", body = ErrorResponse),
    )
)]
pub async fn transition_status(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let ticket = state
        .ticket_service
        .transition_status(
            TicketId::from_uuid(id),
            req.actor_id,
            req.status,
            req.resolution,
        )
        .await?;
    Ok(Json(TicketDto::from_ticket(ticket, Utc::now())))
}

/// `POST /tickets/:id/feedback` — Record the owner's verdict on a
/// completion proposal.
///
/// # Errors
///
/// Returns [`GatewayError`] when the caller does not own the ticket or
/// no proposal is pending.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/feedback",
    tag = "Tickets",
    summary = "Submit citizen feedback",
    description = "Owner-only. Approval completes the ticket; rejection reopens it for further work.",
    params(
        ("id" = uuid::Uuid, Path, description = "Ticket UUID"),
    ),
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Updated ticket", body = TicketDto),
        (status = 403, description = "Caller does not own the ticket", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
        (status = 409, description = "No completion proposal is pending", body = ErrorResponse),
    )
)]
pub async fn submit_feedback(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let ticket = state
        .ticket_service
        .submit_feedback(
            TicketId::from_uuid(id),
            req.citizen_id,
            req.approved,
            req.comments,
        )
        .await?;
    Ok(Json(TicketDto::from_ticket(ticket, Utc::now())))
}

/// `POST /tickets/:id/upvote` — Upvote a ticket.
///
/// # Errors
///
/// Returns [`GatewayError::AlreadyUpvoted`] on a repeat vote.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/upvote",
    tag = "Tickets",
    summary = "Upvote a ticket",
    description = "Registers one upvote. Each user can upvote a given ticket at most once.",
    params(
        ("id" = uuid::Uuid, Path, description = "Ticket UUID"),
    ),
    request_body = UpvoteRequest,
    responses(
        (status = 200, description = "New vote total", body = UpvoteResponse),
        (status = 404, description = "Ticket or user not found", body = ErrorResponse),
        (status = 409, description = "User already upvoted this ticket", body = ErrorResponse),
    )
)]
pub async fn upvote_ticket(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpvoteRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let ticket_id = TicketId::from_uuid(id);
    let upvotes = state.ticket_service.upvote(ticket_id, req.user_id).await?;
    Ok(Json(UpvoteResponse { ticket_id, upvotes }))
}

/// `GET /tickets/stats/sla` — Aggregate SLA health.
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] for non-authority callers.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/stats/sla",
    tag = "Tickets",
    summary = "SLA statistics",
    description = "Authority-only aggregate over all SLA-active tickets: overdue/critical/warning/on-time counts plus a per-criticality breakdown.",
    params(ActorParams),
    responses(
        (status = 200, description = "SLA aggregate", body = SlaStats),
        (status = 403, description = "Caller is not an authority", body = ErrorResponse),
    )
)]
pub async fn sla_stats(
    State(state): State<AppState>,
    Query(params): Query<ActorParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let stats = state
        .ticket_service
        .sla_stats(UserId::from_uuid(params.actor_id))
        .await?;
    Ok(Json(stats))
}

/// Ticket lifecycle routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", post(create_ticket).get(list_tickets))
        .route("/tickets/stats/sla", get(sla_stats))
        .route("/tickets/{id}", get(get_ticket))
        .route("/tickets/{id}/status", put(transition_status))
        .route("/tickets/{id}/feedback", post(submit_feedback))
        .route("/tickets/{id}/upvote", post(upvote_ticket))
}

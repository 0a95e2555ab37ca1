//! REST endpoint handlers organized by resource.

pub mod notification;
pub mod system;
pub mod ticket;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(ticket::routes())
        .merge(notification::routes())
}

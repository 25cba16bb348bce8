//! HTTP layer: route handlers, request parameters, and router composition.
//!
//! The protocol endpoint keeps the path deployed clients already use
//! (`/ufo/masterserver.php`); operational endpoints sit at the root.

pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete router with all endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes())
        .merge(openapi::routes())
}

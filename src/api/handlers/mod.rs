//! HTTP endpoint handlers.

pub mod masterserver;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes the master server protocol routes.
pub fn routes() -> Router<AppState> {
    Router::new().merge(masterserver::routes())
}

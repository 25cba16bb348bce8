//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::persistence::StoreBackend;
use crate::service::RegistryService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Registry operations against the configured record store.
    pub registry: Arc<RegistryService<StoreBackend>>,
    /// Port assumed when a request carries no `port` parameter.
    pub default_port: u16,
    /// Whether `X-Forwarded-For` names the caller.
    pub trust_forwarded_for: bool,
}

//! # ufo-masterserver
//!
//! Game-server discovery registry ("master server").
//!
//! Dedicated game servers announce themselves with `ping`, keep their entry
//! alive with periodic `heartbeat`s and withdraw with `shutdown`; game
//! clients fetch the live list with `query`. Entries that stop
//! heartbeating for longer than the liveness timeout are dropped lazily by
//! whichever request comes next.
//!
//! ## Architecture
//!
//! ```text
//! Game servers / clients (HTTP GET, plain-text replies)
//!     │
//!     ├── Request dispatcher (api/)
//!     │
//!     ├── RegistryService (service/)
//!     ├── Transition rules (domain/)
//!     │
//!     └── RecordStore: file or memory (persistence/)
//! ```
//!
//! No registry state lives in process memory between requests: each request
//! takes the store's exclusive lease, reads the whole snapshot, applies one
//! operation and writes the whole snapshot back.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;

use std::sync::Arc;

use config::{MasterConfig, StoreKind};
use persistence::{FileStore, MemoryStore, StoreBackend};

/// Builds the record store selected by `config`.
///
/// # Errors
///
/// Returns [`error::MasterError::StoreUnavailable`] if the file backend's
/// directory cannot be created.
pub fn build_store(config: &MasterConfig) -> Result<StoreBackend, error::MasterError> {
    Ok(match config.store_kind {
        StoreKind::File => {
            StoreBackend::File(FileStore::open(&config.store_path, config.lock_settings())?)
        }
        StoreKind::Memory => StoreBackend::Memory(MemoryStore::new(config.lock_settings())),
    })
}

/// Builds the shared handler state for `config` around `store`.
#[must_use]
pub fn build_state(config: &MasterConfig, store: StoreBackend) -> app_state::AppState {
    app_state::AppState {
        registry: Arc::new(service::RegistryService::new(store, config.rules())),
        default_port: config.default_port,
        trust_forwarded_for: config.trust_forwarded_for,
    }
}

//! Domain layer: server identity, registry snapshot, and transition rules.
//!
//! Everything here is synchronous and side-effect free. Persistence and
//! locking live in [`crate::persistence`].

pub mod engine;
pub mod server_entry;
pub mod server_id;
pub mod snapshot;

pub use engine::{HeartbeatPolicy, Operation, Outcome, RegistryRules, Transition};
pub use server_entry::ServerEntry;
pub use server_id::ServerId;
pub use snapshot::{RecordError, Snapshot};

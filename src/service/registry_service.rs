//! Registry service: one locked read-modify-write cycle per request.

use chrono::Utc;

use crate::domain::{Operation, RegistryRules, ServerId, Snapshot, Transition, engine};
use crate::error::MasterError;
use crate::persistence::{RecordStore, StoreLease};

/// Orchestration layer for the four registry operations.
///
/// Holds no registry state of its own: every call re-reads the snapshot
/// from the store, so several processes sharing one file store stay
/// consistent. Every call follows the same pattern: acquire lease → read →
/// apply transition rules → write → release.
#[derive(Debug, Clone)]
pub struct RegistryService<S> {
    store: S,
    rules: RegistryRules,
}

impl<S: RecordStore> RegistryService<S> {
    /// Creates a new `RegistryService`.
    #[must_use]
    pub const fn new(store: S, rules: RegistryRules) -> Self {
        Self { store, rules }
    }

    /// Returns a reference to the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Executes `op` for `caller` at the current wall-clock time and returns
    /// the directory after the operation.
    ///
    /// # Errors
    ///
    /// Returns [`MasterError::LockTimeout`] or
    /// [`MasterError::StoreUnavailable`] from the store. In both cases the
    /// persisted snapshot is left as it was.
    pub async fn execute(&self, op: Operation, caller: &ServerId) -> Result<Snapshot, MasterError> {
        self.execute_at(op, caller, Utc::now().timestamp()).await
    }

    /// Executes `op` for `caller` as if the current time were `now`
    /// (seconds since the Unix epoch).
    ///
    /// # Errors
    ///
    /// See [`RegistryService::execute`].
    pub async fn execute_at(
        &self,
        op: Operation,
        caller: &ServerId,
        now: i64,
    ) -> Result<Snapshot, MasterError> {
        let mut lease = self.store.acquire().await?;
        let current = lease.read().await?;
        let outcome = engine::apply(current, op, caller, now, &self.rules);
        lease.write(&outcome.snapshot).await?;

        for transition in &outcome.transitions {
            log_transition(op, transition);
        }
        tracing::debug!(%op, live = outcome.snapshot.len(), "registry updated");
        Ok(outcome.snapshot)
    }
}

fn log_transition(op: Operation, transition: &Transition) {
    match transition {
        Transition::Registered(id) => {
            tracing::info!(%op, host = id.host(), port = id.port(), "server registered");
        }
        Transition::Refreshed(id) => {
            tracing::debug!(%op, host = id.host(), port = id.port(), "server refreshed");
        }
        Transition::Withdrawn(id) => {
            tracing::info!(%op, host = id.host(), port = id.port(), "server withdrawn");
        }
        Transition::Expired(id) => {
            tracing::debug!(%op, host = id.host(), port = id.port(), "server expired");
        }
        Transition::Ignored(id) => {
            tracing::info!(%op, host = id.host(), port = id.port(), "ignored request from unregistered server");
        }
    }
}

//! In-process record store.
//!
//! Holds the persisted text layout in memory behind an async mutex, for
//! single-process deployments and tests. Going through the same text layout
//! as [`super::FileStore`] keeps parsing behaviour identical between the two.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LockSettings, RecordStore, StoreLease, acquire_with_retry};
use crate::domain::Snapshot;
use crate::error::MasterError;

/// Record store kept in process memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    contents: Arc<Mutex<String>>,
    settings: LockSettings,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(settings: LockSettings) -> Self {
        Self::with_contents(String::new(), settings)
    }

    /// Creates a store pre-loaded with persisted text.
    #[must_use]
    pub fn with_contents(contents: impl Into<String>, settings: LockSettings) -> Self {
        Self {
            contents: Arc::new(Mutex::new(contents.into())),
            settings,
        }
    }

    /// Returns a copy of the persisted text, waiting for any holder.
    pub async fn contents(&self) -> String {
        self.contents.lock().await.clone()
    }
}

impl RecordStore for MemoryStore {
    type Lease = MemoryLease;

    async fn acquire(&self) -> Result<MemoryLease, MasterError> {
        acquire_with_retry(&self.settings, || {
            let contents = Arc::clone(&self.contents);
            async move {
                Ok(contents
                    .try_lock_owned()
                    .ok()
                    .map(|guard| MemoryLease { guard }))
            }
        })
        .await
    }
}

/// Exclusive lease on a [`MemoryStore`]. Unlocks on drop.
#[derive(Debug)]
pub struct MemoryLease {
    guard: OwnedMutexGuard<String>,
}

impl StoreLease for MemoryLease {
    async fn read(&mut self) -> Result<Snapshot, MasterError> {
        Ok(Snapshot::parse(&self.guard))
    }

    async fn write(mut self, snapshot: &Snapshot) -> Result<(), MasterError> {
        *self.guard = snapshot.serialize();
        Ok(())
    }
}

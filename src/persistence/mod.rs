//! Persistence layer: the record store holding the registry snapshot.
//!
//! A [`RecordStore`] hands out exclusive [`StoreLease`]s. A lease covers one
//! whole read-modify-write cycle: [`StoreLease::read`] the snapshot, compute
//! the next one, [`StoreLease::write`] it back. Dropping the lease releases
//! exclusivity, so every exit path (including errors and early returns)
//! gives the store back.
//!
//! Acquisition never blocks indefinitely. Contention is retried a bounded
//! number of times with a fixed backoff (see [`LockSettings`]) and then
//! fails with [`MasterError::LockTimeout`].

pub mod file;
pub mod memory;

use std::future::Future;
use std::time::Duration;

pub use file::{FileLease, FileStore};
pub use memory::{MemoryLease, MemoryStore};

use crate::domain::Snapshot;
use crate::error::MasterError;

/// Bounded-retry parameters for exclusive acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockSettings {
    /// Total acquisition attempts before giving up (at least one is made).
    pub retries: u32,
    /// Fixed sleep between attempts.
    pub backoff: Duration,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            retries: 10,
            backoff: Duration::from_millis(100),
        }
    }
}

/// Durable holder of the single registry snapshot.
pub trait RecordStore: Send + Sync {
    /// Exclusive access handle.
    type Lease: StoreLease;

    /// Obtains exclusive access to the persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MasterError::LockTimeout`] when the retry budget runs out
    /// and [`MasterError::StoreUnavailable`] when the backing medium cannot
    /// be opened.
    fn acquire(&self) -> impl Future<Output = Result<Self::Lease, MasterError>> + Send;
}

/// Exclusive access to the persisted snapshot. Released on drop.
pub trait StoreLease: Send {
    /// Parses the persisted snapshot. Malformed lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`MasterError::StoreUnavailable`] if the data cannot be read.
    fn read(&mut self) -> impl Future<Output = Result<Snapshot, MasterError>> + Send;

    /// Replaces the whole persisted snapshot and releases the lease.
    ///
    /// Other acquirers observe either the previous snapshot or this one in
    /// full.
    ///
    /// # Errors
    ///
    /// Returns [`MasterError::StoreUnavailable`] if the data cannot be
    /// written. The previous snapshot stays in place and the lease is still
    /// released.
    fn write(self, snapshot: &Snapshot) -> impl Future<Output = Result<(), MasterError>> + Send;
}

/// Runs `attempt` until it yields a lease, an error, or the retry budget in
/// `settings` is exhausted. `Ok(None)` from `attempt` means "busy".
pub(crate) async fn acquire_with_retry<T, F, Fut>(
    settings: &LockSettings,
    mut attempt: F,
) -> Result<T, MasterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, MasterError>>,
{
    let attempts = settings.retries.max(1);
    for n in 1..=attempts {
        if let Some(lease) = attempt().await? {
            return Ok(lease);
        }
        if n < attempts {
            tracing::debug!(attempt = n, "record store busy, retrying");
            tokio::time::sleep(settings.backoff).await;
        }
    }
    tracing::warn!(attempts, "record store lock timed out");
    Err(MasterError::LockTimeout { attempts })
}

/// Record store selected at startup.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// Text file plus sibling lock file.
    File(FileStore),
    /// In-process text buffer behind an async mutex.
    Memory(MemoryStore),
}

/// Lease handed out by [`StoreBackend`].
#[derive(Debug)]
pub enum BackendLease {
    /// Lease on a [`FileStore`].
    File(FileLease),
    /// Lease on a [`MemoryStore`].
    Memory(MemoryLease),
}

impl RecordStore for StoreBackend {
    type Lease = BackendLease;

    async fn acquire(&self) -> Result<BackendLease, MasterError> {
        match self {
            Self::File(store) => store.acquire().await.map(BackendLease::File),
            Self::Memory(store) => store.acquire().await.map(BackendLease::Memory),
        }
    }
}

impl StoreLease for BackendLease {
    async fn read(&mut self) -> Result<Snapshot, MasterError> {
        match self {
            Self::File(lease) => lease.read().await,
            Self::Memory(lease) => lease.read().await,
        }
    }

    async fn write(self, snapshot: &Snapshot) -> Result<(), MasterError> {
        match self {
            Self::File(lease) => lease.write(snapshot).await,
            Self::Memory(lease) => lease.write(snapshot).await,
        }
    }
}

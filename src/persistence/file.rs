//! File-backed record store.
//!
//! The snapshot lives in a text file. Exclusivity is an OS advisory lock
//! (`flock` on Unix, `LockFileEx` on Windows) held on a sibling
//! `<file>.lock` for the lifetime of a [`FileLease`]. The lock file itself is
//! never deleted; the kernel drops the lock when the handle closes, including
//! when the holding process dies. Writes go to `<file>.tmp` and are renamed
//! over the data file, so a concurrent reader never sees a torn snapshot.

use std::ffi::OsString;
use std::fs::{File, TryLockError};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use super::{LockSettings, RecordStore, StoreLease, acquire_with_retry};
use crate::domain::Snapshot;
use crate::error::MasterError;

/// Record store persisted to a local text file.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_path: PathBuf,
    lock_path: PathBuf,
    settings: LockSettings,
}

impl FileStore {
    /// Creates a store for `path`, creating missing parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`MasterError::StoreUnavailable`] if the parent directory
    /// cannot be created.
    pub fn open(path: impl Into<PathBuf>, settings: LockSettings) -> Result<Self, MasterError> {
        let data_path = path.into();
        if let Some(parent) = data_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            lock_path: sibling(&data_path, ".lock"),
            data_path,
            settings,
        })
    }

    /// Path of the data file.
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Path of the lock file.
    #[must_use]
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    async fn try_lock(&self) -> Result<Option<FileLease>, MasterError> {
        let file = tokio::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .await
            .map_err(|err| {
                tracing::error!(path = %self.lock_path.display(), error = %err, "cannot open lock file");
                MasterError::from(err)
            })?
            .into_std()
            .await;

        match file.try_lock() {
            Ok(()) => {
                let mut lease = FileLease {
                    data_path: self.data_path.clone(),
                    lock: file,
                };
                if let Err(err) = lease.stamp_owner() {
                    tracing::debug!(path = %self.lock_path.display(), error = %err, "could not record lock owner");
                }
                Ok(Some(lease))
            }
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Error(err)) => {
                tracing::error!(path = %self.lock_path.display(), error = %err, "cannot lock record store");
                Err(err.into())
            }
        }
    }
}

impl RecordStore for FileStore {
    type Lease = FileLease;

    async fn acquire(&self) -> Result<FileLease, MasterError> {
        let lease = acquire_with_retry(&self.settings, || self.try_lock()).await?;
        // Fail before any mutation if the data file itself is unusable.
        tokio::fs::OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.data_path)
            .await
            .map_err(|err| {
                tracing::error!(path = %self.data_path.display(), error = %err, "cannot open record store");
                MasterError::from(err)
            })?;
        Ok(lease)
    }
}

/// Exclusive lease on a [`FileStore`]. Unlocks the lock file on drop.
#[derive(Debug)]
pub struct FileLease {
    data_path: PathBuf,
    lock: File,
}

impl FileLease {
    /// Records the holder's pid in the lock file, for operators.
    fn stamp_owner(&mut self) -> io::Result<()> {
        self.lock.set_len(0)?;
        self.lock.rewind()?;
        writeln!(self.lock, "{}", std::process::id())
    }
}

impl StoreLease for FileLease {
    async fn read(&mut self) -> Result<Snapshot, MasterError> {
        match tokio::fs::read(&self.data_path).await {
            Ok(bytes) => Ok(Snapshot::parse(&String::from_utf8_lossy(&bytes))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Snapshot::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(self, snapshot: &Snapshot) -> Result<(), MasterError> {
        let tmp_path = sibling(&self.data_path, ".tmp");
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(snapshot.serialize().as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        if let Err(err) = tokio::fs::rename(&tmp_path, &self.data_path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                tracing::debug!(path = %tmp_path.display(), error = %cleanup, "could not remove temp file");
            }
            return Err(err.into());
        }
        Ok(())
    }
}

impl Drop for FileLease {
    fn drop(&mut self) {
        if let Err(err) = self.lock.unlock() {
            tracing::warn!(error = %err, "failed to release record store lock");
        }
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

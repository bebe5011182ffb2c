//! Cross-process advisory write lock.
//!
//! Grounded on the original's `flock(LOCK_EX)` on a `<db>.lock` sibling
//! file: only one indexer process may hold the writer role against a given
//! `db_path` at a time. An in-process [`parking_lot::Mutex`] in
//! [`super::Store`] serializes writes from within this process; this lock
//! additionally guards against a second process started against the same
//! database file.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;

use crate::error::StoreError;

/// Holds the advisory lock file open for the process lifetime. Dropping
/// this releases the lock.
#[derive(Debug)]
pub struct AdvisoryLock {
    _file: File,
}

impl AdvisoryLock {
    /// Attempts to acquire the exclusive, non-blocking advisory lock on
    /// `<db_path>.lock`.
    ///
    /// # Errors
    /// Returns `StoreError::LockHeld` if another process already holds it.
    pub fn acquire(db_path: &Path) -> Result<Self, StoreError> {
        let lock_path = lock_path(db_path);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StoreError::LockHeld(format!("{}: {e}", lock_path.display())))?;

        file.try_lock_exclusive()
            .map_err(|_| StoreError::LockHeld(lock_path.display().to_string()))?;

        Ok(Self { _file: file })
    }
}

fn lock_path(db_path: &Path) -> std::path::PathBuf {
    let mut s = db_path.as_os_str().to_owned();
    s.push(".lock");
    std::path::PathBuf::from(s)
}

//! File-based locking to prevent concurrent execution.
//!
//! Two runs mutating the same managed records at once would each compute a
//! plan from a baseline the other is changing.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::error::{AdisheError, Result};

/// A guard that holds an exclusive lock on the lock file.
/// The lock is released when the guard is dropped.
#[derive(Debug)]
pub struct LockGuard {
    _file: File,
}

impl LockGuard {
    /// Take the lock without waiting; fails if another run holds it.
    ///
    /// The file is opened with create+read+write (no truncate) so creation
    /// and locking cannot race.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;

        file.try_lock_exclusive()
            .map_err(|_| AdisheError::Locked(path.to_path_buf()))?;

        Ok(Self { _file: file })
    }
}

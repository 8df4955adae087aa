//! Exclusive lock held while a daemon is supervised.
//!
//! The process-table scan in [`crate::discovery`] cannot stop two
//! supervisors that check at the same moment from both spawning a daemon.
//! An advisory `fs2` lock on a file next to the logs closes that window for
//! every supervisor that takes it. The lock is released when the guard is
//! dropped, including when the owning process dies.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

/// Outcome of trying to take the lock.
#[derive(Debug)]
pub enum LockError {
    /// Another process holds the lock
    Held,
    /// The lock file could not be created or locked
    Io(io::Error),
}

/// Guard for the exclusive session lock. Unlocks on drop.
#[derive(Debug)]
pub struct SessionLock {
    file: File,
    path: PathBuf,
}

impl SessionLock {
    /// Takes the lock without waiting.
    ///
    /// # Errors
    ///
    /// `LockError::Held` if another process holds it, `LockError::Io` if
    /// the file cannot be created.
    pub fn try_acquire(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(LockError::Io)?;
        }

        // Opened without truncation; the file only exists to be locked
        #[allow(clippy::suspicious_open_options)]
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(LockError::Io)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "Acquired session lock");
                Ok(Self {
                    file,
                    path: path.to_path_buf(),
                })
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Err(LockError::Held),
            Err(e) => Err(LockError::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!(path = %self.path.display(), error = %e, "Failed to release session lock");
        } else {
            debug!(path = %self.path.display(), "Released session lock");
        }
    }
}

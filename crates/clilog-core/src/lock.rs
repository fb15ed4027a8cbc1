//! Advisory locking for the note log.
//!
//! Writers take an exclusive lock on `<log>.lock` for the whole
//! read-modify-rewrite cycle. Readers take a shared lock so they never see
//! a half-renamed file. The lock is released when the [`LogLock`] drops.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::ErrorCode;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Which side of the reader/writer lock a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Advisory lock errors for the note log.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another process held a conflicting lock for the whole wait.
    #[error("timed out after {waited:?} waiting for lock {}", path.display())]
    Timeout { path: PathBuf, waited: Duration },

    /// The lock file could not be opened or created.
    #[error("cannot open lock file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        mode: LockMode,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    /// Machine-readable code. I/O failures on the read side report as read
    /// failures, so a read-only data directory never looks like a write.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Io {
                mode: LockMode::Shared,
                ..
            } => ErrorCode::LogReadFailed,
            Self::Io {
                mode: LockMode::Exclusive,
                ..
            } => ErrorCode::LogWriteFailed,
        }
    }
}

/// Lock file path guarding a log file: `<name>.lock` next to it.
#[must_use]
pub fn lock_path_for(log_path: &Path) -> PathBuf {
    let mut name = log_path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".lock");
    log_path.with_file_name(name)
}

/// A held advisory lock on a log's lock file.
#[derive(Debug)]
pub struct LogLock {
    file: File,
}

impl LogLock {
    /// Wait up to `timeout` for the exclusive lock.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] on contention, [`LockError::Io`] if the lock
    /// file cannot be created.
    pub fn exclusive(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, timeout, LockMode::Exclusive)
    }

    /// Wait up to `timeout` for a shared lock.
    ///
    /// An existing lock file is opened read-only, so readers work in a
    /// directory they cannot write to.
    ///
    /// # Errors
    ///
    /// Same as [`exclusive`](Self::exclusive).
    pub fn shared(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, timeout, LockMode::Shared)
    }

    fn acquire(path: &Path, timeout: Duration, mode: LockMode) -> Result<Self, LockError> {
        let file = open_lock_file(path, mode).map_err(|source| LockError::Io {
            path: path.to_path_buf(),
            mode,
            source,
        })?;

        let start = Instant::now();
        loop {
            let attempt = match mode {
                LockMode::Shared => FileExt::try_lock_shared(&file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            };
            if attempt.is_ok() {
                return Ok(Self { file });
            }

            let waited = start.elapsed();
            if waited >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for LogLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn open_lock_file(path: &Path, mode: LockMode) -> io::Result<File> {
    if mode == LockMode::Shared {
        match File::open(path) {
            Ok(file) => return Ok(file),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
}

//! Full mirror rebuild from the log.
//!
//! `clilog sync` replaces every row of the mirror with the current content
//! of the log in one transaction, so a concurrent reader sees either the old
//! mirror or the new one. A failed rebuild leaves the old rows in place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rusqlite::{TransactionBehavior, params};
use tracing::{debug, info};

use crate::codec::{LogFormat, RawLine, split_physical_lines};
use crate::db::open_mirror;
use crate::error::ErrorCode;
use crate::lock::{LockError, LogLock, lock_path_for};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a rebuild did not complete.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The log could not be opened or read. The mirror is untouched.
    #[error("log {} unavailable: {source}", path.display())]
    LogUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The mirror database could not be opened or written.
    #[error("mirror storage error: {0:#}")]
    Storage(anyhow::Error),

    /// The rebuild ran past its deadline and was rolled back.
    #[error("rebuild exceeded its {deadline:?} deadline after {lines_scanned} lines")]
    DeadlineExceeded {
        deadline: Duration,
        lines_scanned: usize,
    },

    #[error("{0}")]
    Lock(#[from] LockError),
}

impl MirrorError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::LogUnavailable { .. } => ErrorCode::LogReadFailed,
            Self::Storage(_) => ErrorCode::MirrorUnavailable,
            Self::DeadlineExceeded { .. } => ErrorCode::RebuildDeadlineExceeded,
            Self::Lock(err) => err.code(),
        }
    }
}

fn storage(err: rusqlite::Error, what: &'static str) -> MirrorError {
    MirrorError::Storage(anyhow::Error::new(err).context(what))
}

// ---------------------------------------------------------------------------
// RebuildReport
// ---------------------------------------------------------------------------

/// Summary of a completed rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    /// Physical lines read from the log, blank ones included.
    pub lines_scanned: usize,
    /// Rows now in the mirror.
    pub rows_inserted: usize,
    /// Non-blank lines the codec did not accept, invalid UTF-8 included.
    pub skipped: usize,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// rebuild
// ---------------------------------------------------------------------------

/// Replace the mirror's rows with the notes currently in the log.
///
/// Each decoded line becomes one row keyed by its 1-based physical line
/// number. The log's shared lock is held while reading, and the lock wait
/// counts against `deadline`.
///
/// # Errors
///
/// - [`MirrorError::Storage`] if the mirror cannot be opened or written
/// - [`MirrorError::LogUnavailable`] if the log is missing or unreadable
/// - [`MirrorError::Lock`] if a writer holds the log lock too long
/// - [`MirrorError::DeadlineExceeded`] if the scan outlives `deadline`
pub fn rebuild(
    log_path: &Path,
    db_path: &Path,
    format: LogFormat,
    deadline: Duration,
) -> Result<RebuildReport, MirrorError> {
    let start = Instant::now();

    let mut conn = open_mirror(db_path).map_err(MirrorError::Storage)?;

    if !log_path.exists() {
        return Err(MirrorError::LogUnavailable {
            path: log_path.to_path_buf(),
            source: io::Error::from(io::ErrorKind::NotFound),
        });
    }

    let content = {
        let _lock = LogLock::shared(&lock_path_for(log_path), deadline)?;
        fs::read(log_path).map_err(|source| MirrorError::LogUnavailable {
            path: log_path.to_path_buf(),
            source,
        })?
    };

    let codec = format.codec();
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| storage(e, "begin rebuild transaction"))?;
    tx.execute("DELETE FROM notes", [])
        .map_err(|e| storage(e, "clear mirror"))?;

    let mut lines_scanned = 0;
    let mut rows_inserted = 0;
    let mut skipped = 0;
    {
        let mut insert = tx
            .prepare(
                "INSERT INTO notes (id, status, text, tags, due_date, timestamp) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(|e| storage(e, "prepare mirror insert"))?;

        for (idx, line) in split_physical_lines(&content).enumerate() {
            if start.elapsed() >= deadline {
                return Err(MirrorError::DeadlineExceeded {
                    deadline,
                    lines_scanned,
                });
            }
            lines_scanned += 1;

            if line.is_blank() {
                continue;
            }
            let decoded = match line {
                RawLine::Text(text) => codec.decode(text),
                RawLine::Binary(_) => None,
            };
            let Some(note) = decoded else {
                debug!(line_no = idx + 1, "rebuild skipping unparseable line");
                skipped += 1;
                continue;
            };

            let row_id = i64::try_from(idx + 1).unwrap_or(i64::MAX);
            insert
                .execute(params![
                    row_id,
                    note.status.as_str(),
                    note.text,
                    note.tags_joined(),
                    note.due_text(),
                    note.timestamp_text(),
                ])
                .map_err(|e| storage(e, "insert mirror row"))?;
            rows_inserted += 1;
        }
    }

    tx.commit().map_err(|e| storage(e, "commit rebuild"))?;

    let report = RebuildReport {
        lines_scanned,
        rows_inserted,
        skipped,
        elapsed: start.elapsed(),
    };
    info!(
        lines = report.lines_scanned,
        rows = report.rows_inserted,
        skipped = report.skipped,
        elapsed_ms = report.elapsed.as_millis(),
        "mirror rebuilt"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

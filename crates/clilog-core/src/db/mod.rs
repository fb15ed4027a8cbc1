//! SQLite mirror of the note log.
//!
//! The log is the source of truth; the mirror only exists for ad-hoc SQL
//! queries and can be dropped and rebuilt at any time.
//!
//! Runtime settings:
//! - `journal_mode = WAL` so readers see the old mirror while a rebuild runs
//! - `busy_timeout = 5s`
//! - `synchronous = NORMAL`

pub mod query;
pub mod rebuild;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

/// Busy timeout used for mirror connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the mirror database, apply pragmas, and ensure the
/// `notes` table exists.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the
/// database cannot be opened or configured.
pub fn open_mirror(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create mirror directory {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("open mirror database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    schema::ensure_schema(&conn).context("create mirror schema")?;

    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

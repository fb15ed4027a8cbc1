//! Mirror schema.
//!
//! The mirror is disposable: it is rebuilt wholesale from the log, so there
//! is a single idempotent DDL script and no migration history.
//!
//! - `id` is the 1-based physical line number of the note in the log
//! - `status` is `pending` or `completed`
//! - `tags` is the tag list joined with commas, empty when untagged
//! - `due_date` is `YYYY-MM-DD`, empty when no date is set

/// Table and index definitions, safe to run on every open.
pub const NOTES_SQL: &str = r"
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY,
    status TEXT NOT NULL CHECK (status IN ('pending', 'completed')),
    text TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '',
    due_date TEXT NOT NULL DEFAULT '',
    timestamp TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_notes_status ON notes(status);
CREATE INDEX IF NOT EXISTS idx_notes_due_date ON notes(due_date);
";

/// Create the `notes` table and its indexes if missing.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub fn ensure_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(NOTES_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        ensure_schema(&conn).expect("first apply");
        ensure_schema(&conn).expect("second apply");

        let indexes: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'notes' ORDER BY name")
            .expect("prepare")
            .query_map([], |row| row.get(0))
            .expect("query")
            .collect::<Result<_, _>>()
            .expect("collect");
        assert_eq!(indexes, vec!["idx_notes_due_date", "idx_notes_status"]);
    }

    #[test]
    fn status_check_rejects_unknown_values() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        ensure_schema(&conn).expect("apply");
        let result = conn.execute(
            "INSERT INTO notes (id, status, text) VALUES (1, 'archived', 'x')",
            [],
        );
        assert!(result.is_err());
    }
}

//! Read helpers over the mirror.
//!
//! All functions take a shared `&Connection` and return typed rows.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, params_from_iter};

use crate::model::note::{DUE_DATE_FORMAT, NoteStats, Status};

/// One row of the `notes` mirror table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MirrorRow {
    /// Physical line number in the log.
    pub id: i64,
    pub status: String,
    pub text: String,
    /// Comma-joined tags; empty when untagged.
    pub tags: String,
    /// `YYYY-MM-DD`, empty when unset.
    pub due_date: String,
    pub timestamp: String,
}

impl MirrorRow {
    /// Tags split back into a list.
    #[must_use]
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags.split(',').filter(|t| !t.is_empty()).collect()
    }
}

/// Filter for [`query_notes`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub status: Option<Status>,
    /// Exact tag match against one element of the tag list.
    pub tag: Option<String>,
    /// Only rows with a due date on or before this day.
    pub due_on_or_before: Option<NaiveDate>,
}

/// Rows matching `filter`, ordered by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn query_notes(conn: &Connection, filter: &NoteFilter) -> Result<Vec<MirrorRow>> {
    let mut conditions: Vec<String> = Vec::new();
    let mut param_values: Vec<String> = Vec::new();

    if let Some(status) = filter.status {
        param_values.push(status.as_str().to_string());
        conditions.push(format!("status = ?{}", param_values.len()));
    }

    // instr() is a literal, case-sensitive search; LIKE would treat `_` as
    // a wildcard and fold ASCII case.
    if let Some(ref tag) = filter.tag {
        param_values.push(tag.trim_start_matches('#').to_string());
        conditions.push(format!(
            "instr(',' || tags || ',', ',' || ?{} || ',') > 0",
            param_values.len()
        ));
    }

    if let Some(due) = filter.due_on_or_before {
        param_values.push(due.format(DUE_DATE_FORMAT).to_string());
        conditions.push(format!(
            "due_date <> '' AND due_date <= ?{}",
            param_values.len()
        ));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT id, status, text, tags, due_date, timestamp FROM notes{where_clause} ORDER BY id"
    );

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare query_notes: {sql}"))?;

    let rows = stmt
        .query_map(params_from_iter(param_values.iter()), |row| {
            Ok(MirrorRow {
                id: row.get(0)?,
                status: row.get(1)?,
                text: row.get(2)?,
                tags: row.get(3)?,
                due_date: row.get(4)?,
                timestamp: row.get(5)?,
            })
        })
        .context("execute query_notes")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read query_notes rows")
}

/// Total / pending / completed counts in the mirror.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_by_status(conn: &Connection) -> Result<NoteStats> {
    let (pending, completed): (i64, i64) = conn
        .query_row(
            "SELECT \
                COALESCE(SUM(status = 'pending'), 0), \
                COALESCE(SUM(status = 'completed'), 0) \
             FROM notes",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .context("count notes by status")?;

    let pending = usize::try_from(pending).unwrap_or_default();
    let completed = usize::try_from(completed).unwrap_or_default();
    Ok(NoteStats {
        total: pending + completed,
        pending,
        completed,
    })
}

/// Number of rows in the mirror.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn row_count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
        .context("count mirror rows")?;
    Ok(usize::try_from(count).unwrap_or_default())
}

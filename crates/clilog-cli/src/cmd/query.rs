//! `clilog query`: filter notes through the SQLite mirror.
//!
//! Reads the mirror as of the last sync; ids are physical line numbers in
//! the log, not `list` positions.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use clilog_core::db::open_mirror;
use clilog_core::db::query::{MirrorRow, NoteFilter, query_notes, row_count};
use clilog_core::model::note::Status;

use super::Workspace;
use crate::output::{OutputMode, pretty_rule, render_mode};

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Filter by status: pending or completed.
    #[arg(short, long)]
    pub status: Option<Status>,

    /// Filter by tag (exact match, leading `#` optional).
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Only notes due on or before this date (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub due_before: Option<NaiveDate>,
}

impl QueryArgs {
    fn filter(&self) -> NoteFilter {
        NoteFilter {
            status: self.status,
            tag: self.tag.clone(),
            due_on_or_before: self.due_before,
        }
    }
}

/// Execute `clilog query`.
///
/// # Errors
///
/// Returns an error if the mirror cannot be opened or queried.
pub fn run_query(args: &QueryArgs, ws: &Workspace, output: OutputMode) -> Result<()> {
    let conn = open_mirror(&ws.paths.mirror)?;
    let rows = query_notes(&conn, &args.filter())?;
    let total = row_count(&conn)?;

    render_mode(
        output,
        &rows,
        |rows, w| {
            for row in rows {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    row.id, row.status, row.timestamp, row.due_date, row.text, row.tags
                )?;
            }
            Ok(())
        },
        |rows, w| write_rows_pretty(rows, total, w),
    )
}

fn write_rows_pretty(rows: &[MirrorRow], total: usize, w: &mut dyn Write) -> std::io::Result<()> {
    if rows.is_empty() {
        return writeln!(
            w,
            "No matching notes among {total} mirrored (run `clilog sync` to refresh)"
        );
    }
    writeln!(w, "{:>5}  {:<9}  {:<10}  TEXT", "LINE", "STATUS", "DUE")?;
    pretty_rule(w)?;
    for row in rows {
        write!(w, "{:>5}  {:<9}  {:<10}  {}", row.id, row.status, row.due_date, row.text)?;
        for tag in row.tag_list() {
            write!(w, " #{tag}")?;
        }
        writeln!(w)?;
    }
    pretty_rule(w)?;
    writeln!(w, "{} of {total} mirrored notes", rows.len())
}

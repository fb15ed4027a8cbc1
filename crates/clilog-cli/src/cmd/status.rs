//! `clilog done` / `clilog undo`: flip a note's status.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use clilog_core::model::note::Status;

use super::{NoteView, Workspace, write_note_pretty, write_note_text};
use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Note id, as printed by `clilog list`.
    pub id: usize,
}

/// Set the note at `args.id` to `status`.
///
/// # Errors
///
/// Returns `NotFound` when no note is at `id`, plus lock and I/O errors.
pub fn run_set_status(
    args: &StatusArgs,
    status: Status,
    ws: &Workspace,
    output: OutputMode,
) -> Result<()> {
    let note = ws.store().set_status(args.id, status)?;
    ws.auto_sync();

    let verb = match status {
        Status::Completed => "Completed",
        Status::Pending => "Reopened",
    };
    render_mode(
        output,
        &NoteView::from(&note),
        |n, w| write_note_text(w, n),
        |n, w| {
            write!(w, "{verb} ")?;
            write_note_pretty(w, n)
        },
    )
}

//! `clilog edit`: replace a note's text, keeping tags and creation time.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use clilog_core::model::note::Status;

use super::{NoteView, Workspace, write_note_pretty, write_note_text};
use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Note id, as printed by `clilog list`.
    pub id: usize,

    /// New text. `#word` tokens are added to the existing tags.
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// Also set the status: pending or completed.
    #[arg(short, long)]
    pub status: Option<Status>,
}

/// Execute `clilog edit <id> <text>...`.
///
/// # Errors
///
/// Returns `NotFound` when no note is at `id`, plus the store's validation,
/// lock, and I/O errors.
pub fn run_edit(args: &EditArgs, ws: &Workspace, output: OutputMode) -> Result<()> {
    let note = ws
        .store()
        .update(args.id, &args.text.join(" "), args.status)?;
    ws.auto_sync();

    render_mode(
        output,
        &NoteView::from(&note),
        |n, w| write_note_text(w, n),
        |n, w| {
            write!(w, "Updated ")?;
            write_note_pretty(w, n)
        },
    )
}

//! `clilog add`: append a new pending note.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use super::{NoteView, Workspace, write_note_pretty, write_note_text};
use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Note text. `#word` tokens become tags.
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// Extra tag (repeatable); a leading `#` is optional.
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
}

/// Execute `clilog add`.
///
/// # Errors
///
/// Returns the store error for invalid text/tags, lock contention, or I/O.
pub fn run_add(args: &AddArgs, ws: &Workspace, output: OutputMode) -> Result<()> {
    let note = ws.store().append(&args.text.join(" "), &args.tags)?;
    ws.auto_sync();

    render_mode(
        output,
        &NoteView::from(&note),
        |n, w| write_note_text(w, n),
        |n, w| {
            write!(w, "Added ")?;
            write_note_pretty(w, n)
        },
    )
}

//! `clilog show`: display one note in full.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use super::{NoteView, Workspace};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Note id, as printed by `clilog list`.
    pub id: usize,
}

/// Execute `clilog show <id>`.
///
/// # Errors
///
/// Returns `NotFound` when no note is at `id`, or the store's read error.
pub fn run_show(args: &ShowArgs, ws: &Workspace, output: OutputMode) -> Result<()> {
    let note = ws.store().get(args.id)?;
    let view = NoteView::from(&note);

    render_mode(
        output,
        &view,
        |n, w| writeln!(w, "{}", n.raw),
        |n, w| {
            pretty_section(w, &format!("Note {}", n.id))?;
            writeln!(w, "{}", n.text)?;
            writeln!(w)?;
            pretty_kv(w, "status", &n.status)?;
            if !n.timestamp.is_empty() {
                pretty_kv(w, "created", &n.timestamp)?;
            }
            if let Some(ref due) = n.due_date {
                pretty_kv(w, "due", due)?;
            }
            if !n.tags.is_empty() {
                pretty_kv(w, "tags", n.tags.join(", "))?;
            }
            if let Some(seq) = n.seq {
                pretty_kv(w, "seq", seq.to_string())?;
            }
            pretty_kv(w, "line", &n.raw)
        },
    )
}

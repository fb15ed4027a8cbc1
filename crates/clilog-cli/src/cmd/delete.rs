//! `clilog delete`: remove a note; later ids shift down by one.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use clilog_core::store::StoreError;

use super::{NoteView, Workspace};
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Note id, as printed by `clilog list`.
    pub id: usize,
}

/// Execute `clilog delete <id>`.
///
/// # Errors
///
/// Returns `NotFound` when no note is at `id` (the log is left as is), plus
/// lock and I/O errors.
pub fn run_delete(args: &DeleteArgs, ws: &Workspace, output: OutputMode) -> Result<()> {
    let Some(removed) = ws.store().delete(args.id)? else {
        return Err(StoreError::NotFound { id: args.id }.into());
    };
    ws.auto_sync();

    render(output, &NoteView::from(&removed), |n, w| {
        writeln!(w, "Deleted note {}: {}", n.id, n.text)
    })
}

//! `clilog export`: dump every note as one JSON document.
//!
//! The document is always JSON regardless of output mode:
//!
//! ```json
//! { "export_date": "...", "total_notes": 2, "notes": [ ... ] }
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use serde::Serialize;

use super::{NoteView, Workspace};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Write to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ExportDocument {
    export_date: String,
    total_notes: usize,
    notes: Vec<NoteView>,
}

/// Execute `clilog export`.
///
/// # Errors
///
/// Returns the store error if the log cannot be read, or an I/O error if the
/// document cannot be written.
pub fn run_export(args: &ExportArgs, ws: &Workspace) -> Result<()> {
    let notes: Vec<NoteView> = ws.store().list()?.iter().map(NoteView::from).collect();
    let doc = ExportDocument {
        export_date: Local::now().to_rfc3339(),
        total_notes: notes.len(),
        notes,
    };

    let mut body = serde_json::to_string_pretty(&doc).context("serialize export")?;
    body.push('\n');

    match args.output {
        Some(ref path) => std::fs::write(path, body)
            .with_context(|| format!("write export to {}", path.display())),
        None => io::stdout()
            .lock()
            .write_all(body.as_bytes())
            .context("write export to stdout"),
    }
}

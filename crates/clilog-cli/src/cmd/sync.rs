//! `clilog sync`: rebuild the SQLite mirror from the log.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::Workspace;
use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug)]
pub struct SyncArgs {}

#[derive(Debug, Serialize)]
struct SyncOutput {
    mirror: String,
    lines_scanned: usize,
    rows_inserted: usize,
    skipped: usize,
    elapsed_ms: u128,
}

/// Execute `clilog sync`. Unlike the automatic refresh after mutations, a
/// failure here is reported to the caller.
///
/// # Errors
///
/// Returns the rebuild error (log unavailable, storage, deadline, lock).
pub fn run_sync(_args: &SyncArgs, ws: &Workspace, output: OutputMode) -> Result<()> {
    let report = ws.sync()?;
    let out = SyncOutput {
        mirror: ws.paths.mirror.display().to_string(),
        lines_scanned: report.lines_scanned,
        rows_inserted: report.rows_inserted,
        skipped: report.skipped,
        elapsed_ms: report.elapsed.as_millis(),
    };

    render_mode(
        output,
        &out,
        |o, w| {
            writeln!(
                w,
                "sync: rows={} skipped={} lines={} elapsed_ms={}",
                o.rows_inserted, o.skipped, o.lines_scanned, o.elapsed_ms
            )
        },
        |o, w| {
            writeln!(w, "Mirror rebuilt: {} note(s) in {}", o.rows_inserted, o.mirror)?;
            if o.skipped > 0 {
                writeln!(w, "{} unparseable line(s) skipped", o.skipped)?;
            }
            Ok(())
        },
    )
}

//! `clilog stats`: total, pending, and completed counts.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use clilog_core::db::open_mirror;
use clilog_core::db::query::count_by_status;

use super::Workspace;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Count rows in the SQLite mirror instead of reading the log.
    #[arg(long)]
    pub mirror: bool,
}

/// Execute `clilog stats`.
///
/// # Errors
///
/// Returns the store error if the log cannot be read, or the mirror error
/// with `--mirror`.
pub fn run_stats(args: &StatsArgs, ws: &Workspace, output: OutputMode) -> Result<()> {
    let stats = if args.mirror {
        count_by_status(&open_mirror(&ws.paths.mirror)?)?
    } else {
        ws.store().stats()?
    };
    let heading = if args.mirror { "Mirror" } else { "Notes" };

    render_mode(
        output,
        &stats,
        |s, w| {
            writeln!(
                w,
                "total={} pending={} completed={}",
                s.total, s.pending, s.completed
            )
        },
        |s, w| {
            pretty_section(w, heading)?;
            pretty_kv(w, "total", s.total.to_string())?;
            pretty_kv(w, "pending", s.pending.to_string())?;
            pretty_kv(w, "completed", s.completed.to_string())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: StatsArgs,
    }

    #[test]
    fn mirror_flag_is_optional() {
        assert!(!Wrapper::parse_from(["test"]).args.mirror);
        assert!(Wrapper::parse_from(["test", "--mirror"]).args.mirror);
    }
}

//! `clilog list`: list notes straight from the log.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use clilog_core::model::note::{Note, Status};

use super::{NoteView, Workspace, write_note_pretty, write_note_text};
use crate::output::{OutputMode, pretty_rule, render_mode};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status: pending or completed.
    #[arg(short, long)]
    pub status: Option<Status>,

    /// Filter by tag (exact match, leading `#` optional).
    #[arg(short, long)]
    pub tag: Option<String>,
}

fn matches(note: &Note, args: &ListArgs) -> bool {
    if args.status.is_some_and(|status| note.status != status) {
        return false;
    }
    match args.tag.as_deref() {
        Some(tag) => {
            let tag = tag.trim_start_matches('#');
            note.tags.iter().any(|t| t == tag)
        }
        None => true,
    }
}

/// Execute `clilog list`.
///
/// # Errors
///
/// Returns the store error if the log cannot be read.
pub fn run_list(args: &ListArgs, ws: &Workspace, output: OutputMode) -> Result<()> {
    let notes: Vec<NoteView> = ws
        .store()
        .list()?
        .iter()
        .filter(|note| matches(note, args))
        .map(NoteView::from)
        .collect();

    render_mode(
        output,
        &notes,
        |notes, w| {
            for note in notes {
                write_note_text(w, note)?;
            }
            Ok(())
        },
        |notes, w| {
            if notes.is_empty() {
                return writeln!(w, "No notes found");
            }
            for note in notes {
                write_note_pretty(w, note)?;
            }
            pretty_rule(w)?;
            writeln!(w, "{} note(s)", notes.len())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(status: Option<Status>, tag: Option<&str>) -> ListArgs {
        ListArgs {
            status,
            tag: tag.map(str::to_string),
        }
    }

    #[test]
    fn filters_by_status_and_tag() {
        let mut note = Note::pending("Pay rent", vec!["bills".into()]);
        assert!(matches(&note, &args(None, None)));
        assert!(matches(&note, &args(Some(Status::Pending), Some("#bills"))));
        assert!(!matches(&note, &args(Some(Status::Completed), None)));
        assert!(!matches(&note, &args(None, Some("bill"))));

        note.status = Status::Completed;
        assert!(matches(&note, &args(Some(Status::Completed), Some("bills"))));
    }

    #[test]
    fn status_flag_accepts_aliases() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ListArgs,
        }
        let w = Wrapper::parse_from(["test", "--status", "done"]);
        assert_eq!(w.args.status, Some(Status::Completed));
        assert!(Wrapper::try_parse_from(["test", "--status", "archived"]).is_err());
    }
}

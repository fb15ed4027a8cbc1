pub mod add;
pub mod completions;
pub mod delete;
pub mod edit;
pub mod export;
pub mod init;
pub mod list;
pub mod query;
pub mod show;
pub mod stats;
pub mod status;
pub mod sync;

use std::io::{self, Write};

use anyhow::Result;
use clilog_core::config::{self, ClilogConfig, ResolvedPaths};
use clilog_core::db::rebuild::{RebuildReport, rebuild};
use clilog_core::model::note::Note;
use clilog_core::store::LogStore;
use serde::Serialize;
use tracing::{debug, warn};

/// Resolved data directory, config, and file paths for one invocation.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub config: ClilogConfig,
    pub paths: ResolvedPaths,
}

impl Workspace {
    /// Locate the data directory and load its config.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory can be determined or
    /// `config.toml` is unreadable.
    pub fn load() -> Result<Self> {
        let data_dir = config::data_dir()?;
        let config = config::load_config(&data_dir)?;
        let paths = config.resolve_paths(&data_dir);
        debug!(data_dir = %paths.data_dir.display(), log = %paths.log.display(), "workspace resolved");
        Ok(Self { config, paths })
    }

    pub fn store(&self) -> LogStore {
        self.config.open_store(&self.paths)
    }

    /// Rebuild the mirror from the log.
    ///
    /// # Errors
    ///
    /// Returns the rebuild failure unchanged.
    pub fn sync(&self) -> Result<RebuildReport> {
        let report = rebuild(
            &self.paths.log,
            &self.paths.mirror,
            self.config.log.format,
            self.config.rebuild_deadline(),
        )?;
        Ok(report)
    }

    /// Refresh the mirror after a mutation when `mirror.auto_sync` is on.
    ///
    /// The log write already succeeded, so a failed rebuild only leaves the
    /// mirror stale and is logged, not returned.
    pub fn auto_sync(&self) {
        if !self.config.mirror.auto_sync {
            return;
        }
        if let Err(err) = self.sync() {
            warn!(error = %format!("{err:#}"), "mirror is stale; run `clilog sync` to refresh it");
        }
    }
}

/// A note as emitted by every command's JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct NoteView {
    pub id: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    pub status: String,
    pub text: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub timestamp: String,
    pub raw: String,
}

impl From<&Note> for NoteView {
    fn from(note: &Note) -> Self {
        let due = note.due_text();
        Self {
            id: note.id,
            seq: note.seq,
            status: note.status.as_str().to_string(),
            text: note.text.clone(),
            tags: note.tags.clone(),
            due_date: (!due.is_empty()).then_some(due),
            timestamp: note.timestamp_text(),
            raw: note.raw.clone(),
        }
    }
}

impl NoteView {
    fn marker(&self) -> &'static str {
        if self.status == "completed" { "[X]" } else { "[ ]" }
    }

    fn hashtags(&self) -> String {
        self.tags
            .iter()
            .map(|t| format!("#{t}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One aligned line per note for pretty output.
fn write_note_pretty(w: &mut dyn Write, note: &NoteView) -> io::Result<()> {
    write!(w, "{:>4}  {} ", note.id, note.marker())?;
    if !note.timestamp.is_empty() {
        write!(w, "{}  ", note.timestamp)?;
    }
    write!(w, "{}", note.text)?;
    if !note.tags.is_empty() {
        write!(w, "  {}", note.hashtags())?;
    }
    if let Some(ref due) = note.due_date {
        write!(w, "  (due {due})")?;
    }
    writeln!(w)
}

/// Tab-separated row: id, status, timestamp, due, text, tags.
fn write_note_text(w: &mut dyn Write, note: &NoteView) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}\t{}",
        note.id,
        note.status,
        note.timestamp,
        note.due_date.as_deref().unwrap_or(""),
        note.text,
        note.tags.join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clilog_core::model::note::{DueDate, Status, parse_timestamp};

    fn sample() -> NoteView {
        let mut note = Note::pending("Pay rent", vec!["bills".into(), "urgent".into()]);
        note.id = 2;
        note.status = Status::Completed;
        note.due = DueDate::parse("2024-02-01");
        note.timestamp = parse_timestamp("2024-01-02 09:00");
        note.raw = "[X] (2024-01-02 09:00) Pay rent [DUE:2024-02-01] #bills #urgent".into();
        NoteView::from(&note)
    }

    #[test]
    fn view_flattens_note_fields() {
        let view = sample();
        assert_eq!(view.status, "completed");
        assert_eq!(view.due_date.as_deref(), Some("2024-02-01"));
        assert_eq!(view.timestamp, "2024-01-02 09:00");
    }

    #[test]
    fn unset_due_is_omitted() {
        let mut note = Note::pending("x", vec![]);
        note.due = Some(DueDate::Unset);
        let json = serde_json::to_value(NoteView::from(&note)).expect("serialize");
        assert!(json.get("due_date").is_none());
        assert!(json.get("seq").is_none());
    }

    #[test]
    fn pretty_and_text_rows() {
        let view = sample();
        let mut buf = Vec::new();
        write_note_pretty(&mut buf, &view).expect("write");
        let pretty = String::from_utf8(buf).expect("utf8");
        assert_eq!(
            pretty,
            "   2  [X] 2024-01-02 09:00  Pay rent  #bills #urgent  (due 2024-02-01)\n"
        );

        let mut buf = Vec::new();
        write_note_text(&mut buf, &view).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(
            text,
            "2\tcompleted\t2024-01-02 09:00\t2024-02-01\tPay rent\tbills,urgent\n"
        );
    }
}

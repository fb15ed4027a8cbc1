use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Rendering used for the creation timestamp inside a log line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Rendering used for due dates.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Literal written in place of a due date when none is set.
pub const DUE_SENTINEL: &str = "-";

/// Completion state of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Completed,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    /// Bracketed marker written at the start of a line.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Pending => "[ ]",
            Self::Completed => "[X]",
        }
    }

    /// Parse a bracketed marker. Lowercase `x` is accepted.
    #[must_use]
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "[ ]" => Some(Self::Pending),
            "[X]" | "[x]" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}': expected pending or completed")]
pub struct ParseStatusError(pub String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "open" | "todo" => Ok(Self::Pending),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Due-date field carried by formats that embed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DueDate {
    /// The `-` sentinel: field present, no date set.
    Unset,
    On(NaiveDate),
}

impl DueDate {
    /// Parse either the sentinel or a `YYYY-MM-DD` date.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value == DUE_SENTINEL {
            return Some(Self::Unset);
        }
        parse_iso_date(value).map(Self::On)
    }

    /// The date, if one is set.
    #[must_use]
    pub const fn date(self) -> Option<NaiveDate> {
        match self {
            Self::Unset => None,
            Self::On(date) => Some(date),
        }
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str(DUE_SENTINEL),
            Self::On(date) => write!(f, "{}", date.format(DUE_DATE_FORMAT)),
        }
    }
}

/// Strict `YYYY-MM-DD` parse: exactly ten characters, zero padded.
#[must_use]
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(value, DUE_DATE_FORMAT).ok()
}

/// Strict `YYYY-MM-DD HH:MM` parse.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 16
        && bytes[10] == b' '
        && bytes[13] == b':'
        && parse_iso_date(value.get(..10)?).is_some()
        && bytes[11..13].iter().all(u8::is_ascii_digit)
        && bytes[14..16].iter().all(u8::is_ascii_digit);
    if !shaped {
        return None;
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()
}

/// Render a timestamp the way it appears in the log.
#[must_use]
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// One decoded log line.
///
/// `id` is the note's 1-based position among decoded lines at the moment the
/// log was read. It is not stable: a delete shifts every later id down by
/// one, so callers must re-list before addressing a note by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: usize,
    /// Number embedded at the start of a `numbered` line. Stable across edits.
    pub seq: Option<u64>,
    pub status: Status,
    pub text: String,
    pub tags: Vec<String>,
    /// `None` when the line format carries no due field at all.
    pub due: Option<DueDate>,
    pub timestamp: Option<NaiveDateTime>,
    /// The exact persisted line.
    pub raw: String,
}

impl Note {
    /// A fresh pending note with no position, timestamp, or raw form yet.
    #[must_use]
    pub fn pending(text: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            id: 0,
            seq: None,
            status: Status::Pending,
            text: text.into(),
            tags,
            due: None,
            timestamp: None,
            raw: String::new(),
        }
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.status, Status::Completed)
    }

    /// Tags joined with commas, as stored in the mirror.
    #[must_use]
    pub fn tags_joined(&self) -> String {
        self.tags.join(",")
    }

    /// Due date as mirror text: `YYYY-MM-DD`, or empty when unset/absent.
    #[must_use]
    pub fn due_text(&self) -> String {
        self.due
            .and_then(DueDate::date)
            .map(|date| date.format(DUE_DATE_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// Timestamp as log text, or empty when absent.
    #[must_use]
    pub fn timestamp_text(&self) -> String {
        self.timestamp.map(format_timestamp).unwrap_or_default()
    }
}

/// Aggregate counts over a set of notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoteStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

impl NoteStats {
    #[must_use]
    pub fn from_notes(notes: &[Note]) -> Self {
        let completed = notes.iter().filter(|n| n.is_completed()).count();
        Self {
            total: notes.len(),
            pending: notes.len() - completed,
            completed,
        }
    }
}

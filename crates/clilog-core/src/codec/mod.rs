//! Line codecs: text line <-> [`Note`].
//!
//! Two line grammars are supported, each behind the [`LineCodec`] trait and
//! selected with [`LogFormat`]:
//!
//! ```text
//! bracket:   [ ] (2024-01-01 10:00) Buy milk #errand
//! numbered:  3. [X] | Due: 2024-02-01 | (2024-01-01 10:00) Pay rent #bills
//! ```
//!
//! Decoding never fails hard. A line that does not fit the grammar yields
//! `None` and the caller skips it.

pub mod bracket;
pub mod numbered;

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::model::note::{Note, Status, parse_timestamp};

pub use bracket::BracketCodec;
pub use numbered::NumberedCodec;

/// Transcoding between one log line and one [`Note`].
pub trait LineCodec: Send + Sync {
    /// Decode a single line (no trailing newline). `None` means skip.
    ///
    /// The returned note has `id == 0`; positions are assigned by the store.
    fn decode(&self, line: &str) -> Option<Note>;

    /// Encode a note, using `now` when the note carries no timestamp.
    fn encode_at(&self, note: &Note, now: NaiveDateTime) -> String;

    /// Encode a note, stamping it with the current local time if needed.
    fn encode(&self, note: &Note) -> String {
        self.encode_at(note, local_now())
    }

    /// Whether lines carry an embedded sequence number that appends must
    /// continue from.
    fn embeds_sequence(&self) -> bool {
        false
    }

    /// Whether lines carry a due-date field.
    fn embeds_due(&self) -> bool {
        false
    }
}

/// Which line grammar the log uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `[ ] (timestamp) text #tags`
    #[default]
    Bracket,
    /// `N. [ ] | Due: date | (timestamp) text #tags`
    Numbered,
}

static BRACKET: BracketCodec = BracketCodec;
static NUMBERED: NumberedCodec = NumberedCodec;

impl LogFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bracket => "bracket",
            Self::Numbered => "numbered",
        }
    }

    /// The codec implementing this format.
    #[must_use]
    pub fn codec(self) -> &'static dyn LineCodec {
        match self {
            Self::Bracket => &BRACKET,
            Self::Numbered => &NUMBERED,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bracket" | "a" => Ok(Self::Bracket),
            "numbered" | "b" => Ok(Self::Numbered),
            other => Err(format!(
                "unknown log format '{other}': expected bracket or numbered"
            )),
        }
    }
}

/// Current local wall-clock time truncated to the minute.
#[must_use]
pub fn local_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

// ---------------------------------------------------------------------------
// Physical lines
// ---------------------------------------------------------------------------

/// One physical line of a log file, terminator removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawLine<'a> {
    Text(&'a str),
    /// A line that is not valid UTF-8. It can never decode, but a rewrite
    /// must still carry its bytes.
    Binary(&'a [u8]),
}

impl<'a> RawLine<'a> {
    /// Whitespace only. A binary line is never blank.
    #[must_use]
    pub fn is_blank(self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }

    /// The line's bytes with trailing whitespace removed.
    #[must_use]
    pub fn trimmed_bytes(self) -> &'a [u8] {
        match self {
            Self::Text(text) => text.trim_end().as_bytes(),
            Self::Binary(bytes) => bytes.trim_ascii_end(),
        }
    }
}

/// Split raw file content on `\n` (and `\r\n`), checking UTF-8 per line.
///
/// A trailing newline does not yield an extra empty line.
pub fn split_physical_lines(content: &[u8]) -> impl Iterator<Item = RawLine<'_>> {
    content.split_inclusive(|&b| b == b'\n').map(|line| {
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        std::str::from_utf8(line).map_or(RawLine::Binary(line), RawLine::Text)
    })
}

// ---------------------------------------------------------------------------
// Shared grammar pieces
// ---------------------------------------------------------------------------

const MARKER_LEN: usize = 3;

/// Split a leading status marker off `line`.
pub(crate) fn split_marker(line: &str) -> Option<(Status, &str)> {
    let marker = line.get(..MARKER_LEN)?;
    let status = Status::from_marker(marker)?;
    Some((status, &line[MARKER_LEN..]))
}

/// Remove the first parenthesized `(YYYY-MM-DD HH:MM)` segment from `text`.
pub(crate) fn take_timestamp(text: &str) -> (Option<NaiveDateTime>, String) {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find('(') {
        let open = search_from + rel;
        let candidate = text
            .get(open + 1..open + 17)
            .filter(|_| text.get(open + 17..open + 18) == Some(")"))
            .and_then(parse_timestamp);
        if let Some(ts) = candidate {
            let mut rest = String::with_capacity(text.len());
            rest.push_str(&text[..open]);
            rest.push_str(&text[open + 18..]);
            return (Some(ts), rest);
        }
        search_from = open + 1;
    }
    (None, text.to_string())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether `tag` is a valid tag body (one or more word characters).
#[must_use]
pub fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty() && tag.chars().all(is_word_char)
}

/// Pull every `#word` token out of `text`, in order of appearance.
///
/// Returns the text with tokens removed (trimmed at both ends) and the tags.
/// Duplicates are kept.
#[must_use]
pub fn split_inline_tags(text: &str) -> (String, Vec<String>) {
    let mut rest = String::with_capacity(text.len());
    let mut tags = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        let starts_tag = c == '#' && chars.peek().is_some_and(|&(_, next)| is_word_char(next));
        if !starts_tag {
            rest.push(c);
            continue;
        }
        let start = idx + c.len_utf8();
        let mut end = start;
        while let Some(&(i, next)) = chars.peek() {
            if !is_word_char(next) {
                break;
            }
            end = i + next.len_utf8();
            chars.next();
        }
        tags.push(text[start..end].to_string());
    }

    (rest.trim().to_string(), tags)
}

/// Join the non-empty parts of a line with single spaces and append tags.
pub(crate) fn join_body(parts: &[&str], tags: &[String]) -> String {
    let mut line = parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    for tag in tags {
        line.push_str(" #");
        line.push_str(tag);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::note::format_timestamp;

    #[test]
    fn physical_lines_survive_invalid_utf8() {
        let content = b"[ ] one\r\ngarbage \xff\xfe line\n\n[ ] two";
        let lines: Vec<RawLine<'_>> = split_physical_lines(content).collect();
        assert_eq!(
            lines,
            vec![
                RawLine::Text("[ ] one"),
                RawLine::Binary(b"garbage \xff\xfe line"),
                RawLine::Text(""),
                RawLine::Text("[ ] two"),
            ]
        );
        assert!(lines[2].is_blank());
        assert!(!lines[1].is_blank());
    }

    #[test]
    fn physical_lines_ignore_final_newline() {
        assert_eq!(split_physical_lines(b"").count(), 0);
        assert_eq!(split_physical_lines(b"a\n").count(), 1);
        assert_eq!(RawLine::Binary(b"\xff  ").trimmed_bytes(), b"\xff");
    }

    #[test]
    fn split_marker_reads_fixed_prefix() {
        assert_eq!(
            split_marker("[X] rest"),
            Some((Status::Completed, " rest"))
        );
        assert_eq!(split_marker("[ ]"), Some((Status::Pending, "")));
        assert_eq!(split_marker("x [ ] late marker"), None);
        assert_eq!(split_marker("[]"), None);
    }

    #[test]
    fn take_timestamp_removes_first_valid_segment() {
        let (ts, rest) = take_timestamp(" (note) (2024-01-01 10:00) Buy milk");
        assert_eq!(ts.map(format_timestamp).as_deref(), Some("2024-01-01 10:00"));
        assert_eq!(rest, " (note)  Buy milk");
    }

    #[test]
    fn take_timestamp_ignores_invalid_dates() {
        let (ts, rest) = take_timestamp("(2024-13-01 10:00) nope");
        assert_eq!(ts, None);
        assert_eq!(rest, "(2024-13-01 10:00) nope");
    }

    #[test]
    fn take_timestamp_handles_multibyte_text() {
        let (ts, rest) = take_timestamp("café (déjà vu) (2024-05-06 07:08)");
        assert!(ts.is_some());
        assert_eq!(rest, "café (déjà vu) ");
    }

    #[test]
    fn inline_tags_extracted_in_order_with_duplicates() {
        let (text, tags) = split_inline_tags("Pay #bills rent #urgent #bills");
        assert_eq!(text, "Pay  rent");
        assert_eq!(tags, vec!["bills", "urgent", "bills"]);
    }

    #[test]
    fn bare_hash_is_not_a_tag() {
        let (text, tags) = split_inline_tags("item # 4 and #");
        assert_eq!(text, "item # 4 and #");
        assert!(tags.is_empty());
    }

    #[test]
    fn unicode_word_tags() {
        let (text, tags) = split_inline_tags("lembrar #café_da_manhã!");
        assert_eq!(text, "lembrar !");
        assert_eq!(tags, vec!["café_da_manhã"]);
    }

    #[test]
    fn tag_validation() {
        assert!(is_valid_tag("health_2"));
        assert!(!is_valid_tag(""));
        assert!(!is_valid_tag("two words"));
        assert!(!is_valid_tag("#x"));
    }

    #[test]
    fn log_format_parses_names() {
        assert_eq!("Numbered".parse::<LogFormat>(), Ok(LogFormat::Numbered));
        assert_eq!("bracket".parse::<LogFormat>(), Ok(LogFormat::Bracket));
        assert!("csv".parse::<LogFormat>().is_err());
        assert!(LogFormat::Numbered.codec().embeds_sequence());
        assert!(!LogFormat::Bracket.codec().embeds_sequence());
    }
}

//! The `bracket` line grammar:
//!
//! ```text
//! [<marker>] (<YYYY-MM-DD HH:MM>) <text> [DUE:<YYYY-MM-DD>] #tag #tag
//! ```
//!
//! The `[DUE:…]` annotation is optional and may appear anywhere after the
//! marker. Without it the note's `due` is `None`.

use chrono::NaiveDateTime;

use super::{LineCodec, join_body, split_inline_tags, split_marker, take_timestamp};
use crate::model::note::{DUE_DATE_FORMAT, DueDate, Note, format_timestamp, parse_iso_date};

const DUE_OPEN: &str = "[DUE:";

#[derive(Debug, Clone, Copy, Default)]
pub struct BracketCodec;

impl LineCodec for BracketCodec {
    fn decode(&self, line: &str) -> Option<Note> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (status, body) = split_marker(line)?;
        let (timestamp, body) = take_timestamp(body);
        let (due, body) = take_due_annotation(&body);
        let (text, tags) = split_inline_tags(&body);

        Some(Note {
            id: 0,
            seq: None,
            status,
            text,
            tags,
            due,
            timestamp,
            raw: line.to_string(),
        })
    }

    fn encode_at(&self, note: &Note, now: NaiveDateTime) -> String {
        let stamp = format!("({})", format_timestamp(note.timestamp.unwrap_or(now)));
        let due = match note.due {
            Some(DueDate::On(date)) => format!("{DUE_OPEN}{}]", date.format(DUE_DATE_FORMAT)),
            Some(DueDate::Unset) | None => String::new(),
        };
        join_body(&[note.status.marker(), &stamp, &note.text, &due], &note.tags)
    }
}

/// Remove the first well-formed `[DUE:YYYY-MM-DD]` annotation.
fn take_due_annotation(text: &str) -> (Option<DueDate>, String) {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find(DUE_OPEN) {
        let open = search_from + rel;
        let date_start = open + DUE_OPEN.len();
        let date = text
            .get(date_start..date_start + 10)
            .filter(|_| text.get(date_start + 10..date_start + 11) == Some("]"))
            .and_then(parse_iso_date);
        if let Some(date) = date {
            let mut rest = String::with_capacity(text.len());
            rest.push_str(&text[..open]);
            rest.push_str(&text[date_start + 11..]);
            return (Some(DueDate::On(date)), rest);
        }
        search_from = date_start;
    }
    (None, text.to_string())
}

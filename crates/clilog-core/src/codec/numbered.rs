//! The `numbered` line grammar:
//!
//! ```text
//! <seq>. [<marker>] | Due: <YYYY-MM-DD | -> | (<YYYY-MM-DD HH:MM>) <text> #tag #tag
//! ```
//!
//! `seq` is written once at append time and never renumbered, so it stays
//! stable while position ids shift.

use chrono::NaiveDateTime;

use super::{LineCodec, join_body, split_inline_tags, split_marker, take_timestamp};
use crate::model::note::{DueDate, Note, format_timestamp};

#[derive(Debug, Clone, Copy, Default)]
pub struct NumberedCodec;

impl LineCodec for NumberedCodec {
    fn decode(&self, line: &str) -> Option<Note> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (seq, rest) = line.split_once(". ")?;
        if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let seq: u64 = seq.parse().ok()?;

        let (status, rest) = split_marker(rest)?;
        let rest = rest
            .trim_start()
            .strip_prefix('|')?
            .trim_start()
            .strip_prefix("Due:")?;
        let (due, rest) = rest.split_once('|')?;
        let due = DueDate::parse(due)?;

        let (timestamp, body) = take_timestamp(rest);
        let (text, tags) = split_inline_tags(&body);

        Some(Note {
            id: 0,
            seq: Some(seq),
            status,
            text,
            tags,
            due: Some(due),
            timestamp,
            raw: line.to_string(),
        })
    }

    fn encode_at(&self, note: &Note, now: NaiveDateTime) -> String {
        let seq = note.seq.unwrap_or(note.id as u64);
        let due = note.due.unwrap_or(DueDate::Unset);
        let stamp = format!("({})", format_timestamp(note.timestamp.unwrap_or(now)));
        let body = join_body(&[&stamp, &note.text], &note.tags);
        format!("{seq}. {} | Due: {due} | {body}", note.status.marker())
    }

    fn embeds_sequence(&self) -> bool {
        true
    }

    fn embeds_due(&self) -> bool {
        true
    }
}

//! Property tests for the line codecs.

use chrono::{NaiveDate, NaiveDateTime};
use clilog_core::codec::{LineCodec, LogFormat};
use clilog_core::model::note::{DueDate, Note, Status};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![Just(Status::Pending), Just(Status::Completed)]
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28)
        .prop_filter_map("valid date", |(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
}

fn arb_timestamp() -> impl Strategy<Value = NaiveDateTime> {
    (arb_date(), 0u32..24, 0u32..60)
        .prop_filter_map("valid time", |(date, h, m)| date.and_hms_opt(h, m, 0))
}

fn arb_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ,.!?'-]{0,40}[A-Za-z0-9.!?]"
}

fn arb_tags() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z_][a-z0-9_]{0,8}", 0..4)
}

fn arb_note(format: LogFormat) -> impl Strategy<Value = Note> {
    (
        arb_status(),
        arb_text(),
        arb_tags(),
        prop::option::of(arb_date()),
        arb_timestamp(),
        1u64..100_000,
    )
        .prop_map(move |(status, text, tags, due, ts, seq)| {
            let mut note = Note::pending(text, tags);
            note.status = status;
            note.timestamp = Some(ts);
            match format {
                LogFormat::Bracket => note.due = due.map(DueDate::On),
                LogFormat::Numbered => {
                    note.seq = Some(seq);
                    note.due = Some(due.map_or(DueDate::Unset, DueDate::On));
                }
            }
            note
        })
}

fn assert_same_content(decoded: &Note, original: &Note) -> Result<(), TestCaseError> {
    prop_assert_eq!(decoded.status, original.status);
    prop_assert_eq!(&decoded.text, &original.text);
    prop_assert_eq!(&decoded.tags, &original.tags);
    prop_assert_eq!(decoded.due, original.due);
    prop_assert_eq!(decoded.timestamp, original.timestamp);
    prop_assert_eq!(decoded.seq, original.seq);
    Ok(())
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn bracket_decode_inverts_encode(note in arb_note(LogFormat::Bracket)) {
        let codec = LogFormat::Bracket.codec();
        let line = codec.encode(&note);
        let decoded = codec.decode(&line).ok_or_else(|| TestCaseError::fail(format!("did not decode: {line}")))?;
        assert_same_content(&decoded, &note)?;
        prop_assert_eq!(decoded.raw, line);
    }

    #[test]
    fn numbered_decode_inverts_encode(note in arb_note(LogFormat::Numbered)) {
        let codec = LogFormat::Numbered.codec();
        let line = codec.encode(&note);
        let decoded = codec.decode(&line).ok_or_else(|| TestCaseError::fail(format!("did not decode: {line}")))?;
        assert_same_content(&decoded, &note)?;
    }

    #[test]
    fn decode_never_panics(line in any::<String>()) {
        for format in [LogFormat::Bracket, LogFormat::Numbered] {
            let _ = format.codec().decode(&line);
        }
    }

    #[test]
    fn decoded_lines_reencode_to_a_fixed_point(line in "\\[[ X]\\] \\(20[0-9]{2}-0[1-9]-1[0-9] [01][0-9]:[0-5][0-9]\\) [a-z #]{1,30}") {
        let codec = LogFormat::Bracket.codec();
        if let Some(first) = codec.decode(&line) {
            let once = codec.encode(&first);
            let second = codec.decode(&once).ok_or_else(|| TestCaseError::fail("re-encoded line must decode"))?;
            prop_assert_eq!(codec.encode(&second), once);
        }
    }
}

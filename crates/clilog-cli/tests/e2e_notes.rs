//! E2E CLI tests covering:
//! - `clilog init` / `add` / `list` / `show` / `edit` / `done` / `undo` / `delete`
//! - Mirror commands (`sync`, `query`) and automatic refresh after writes
//! - `stats` and `export` JSON contracts
//! - Error codes for missing notes and invalid input
//!
//! Each test runs the `clilog` binary as a subprocess against an isolated
//! data directory (`CLILOG_DIR`).

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn clilog_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("clilog"));
    cmd.env("CLILOG_DIR", dir);
    cmd.env("CLILOG_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn init(dir: &Path) {
    clilog_cmd(dir).arg("init").assert().success();
}

fn json_of(dir: &Path, args: &[&str]) -> Value {
    let output = clilog_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

fn error_of(dir: &Path, args: &[&str]) -> Value {
    let output = clilog_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(!output.status.success(), "{args:?} should fail");
    serde_json::from_slice(&output.stderr).expect("error should be JSON on stderr")
}

fn seed(dir: &Path, content: &str) {
    fs::write(dir.join("notes.log"), content).expect("seed log");
}

const SAMPLE: &str = "[ ] (2024-01-01 10:00) Buy milk #errand\n\
                      [X] (2024-01-02 09:00) Pay rent #bills #urgent\n";

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn init_creates_data_files() {
    let dir = TempDir::new().expect("tempdir");
    let json = json_of(dir.path(), &["init"]);
    assert_eq!(json["created_log"], true);
    assert_eq!(json["created_config"], true);
    assert!(dir.path().join("notes.log").exists());
    assert!(dir.path().join("clilog.db").exists());
    assert!(dir.path().join("config.toml").exists());

    let again = json_of(dir.path(), &["init"]);
    assert_eq!(again["created_log"], false);
}

#[test]
fn add_then_list_shows_note_last() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());

    let added = json_of(dir.path(), &["add", "Call", "dentist", "--tag", "health"]);
    assert_eq!(added["id"], 1);
    assert_eq!(added["status"], "pending");
    assert_eq!(added["text"], "Call dentist");
    assert_eq!(added["tags"], serde_json::json!(["health"]));

    json_of(dir.path(), &["add", "Buy milk #errand"]);
    let list = json_of(dir.path(), &["list"]);
    let notes = list.as_array().expect("array");
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[1]["id"], 2);
    assert_eq!(notes[1]["text"], "Buy milk");
    assert_eq!(notes[1]["tags"], serde_json::json!(["errand"]));
}

#[test]
fn list_filters_and_delete_shifts_ids() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path(), SAMPLE);

    let completed = json_of(dir.path(), &["list", "--status", "completed"]);
    assert_eq!(completed.as_array().map(Vec::len), Some(1));
    assert_eq!(completed[0]["text"], "Pay rent");

    let tagged = json_of(dir.path(), &["list", "--tag", "errand"]);
    assert_eq!(tagged[0]["id"], 1);

    let removed = json_of(dir.path(), &["delete", "1"]);
    assert_eq!(removed["text"], "Buy milk");

    let list = json_of(dir.path(), &["list"]);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["id"], 1);
    assert_eq!(list[0]["text"], "Pay rent");
}

#[test]
fn done_undo_and_edit_rewrite_the_line() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path(), SAMPLE);

    let done = json_of(dir.path(), &["done", "1"]);
    assert_eq!(done["raw"], "[X] (2024-01-01 10:00) Buy milk #errand");

    let undone = json_of(dir.path(), &["undo", "2"]);
    assert_eq!(undone["status"], "pending");

    json_of(dir.path(), &["edit", "1", "Buy", "oat", "milk"]);
    let content = fs::read_to_string(dir.path().join("notes.log")).expect("read log");
    assert_eq!(
        content,
        "[X] (2024-01-01 10:00) Buy oat milk #errand\n\
         [ ] (2024-01-02 09:00) Pay rent #bills #urgent\n"
    );
}

#[test]
fn show_pretty_output() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path(), SAMPLE);

    clilog_cmd(dir.path())
        .args(["show", "2", "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Note 2"))
        .stdout(predicate::str::contains("Pay rent"))
        .stdout(predicate::str::contains("bills, urgent"));
}

#[test]
fn text_list_is_tab_separated() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path(), SAMPLE);

    clilog_cmd(dir.path())
        .args(["list", "--format", "text"])
        .assert()
        .success()
        .stdout("1\tpending\t2024-01-01 10:00\t\tBuy milk\terrand\n\
                 2\tcompleted\t2024-01-02 09:00\t\tPay rent\tbills,urgent\n");
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn missing_note_reports_not_found_code() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path(), SAMPLE);

    for args in [["delete", "9"], ["done", "9"], ["show", "9"]] {
        let err = error_of(dir.path(), &args);
        assert_eq!(err["error"]["error_code"], "E2001", "{args:?}");
    }
    let content = fs::read_to_string(dir.path().join("notes.log")).expect("read log");
    assert_eq!(content, SAMPLE);
}

#[test]
fn invalid_tag_reports_invalid_note_code() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    let err = error_of(dir.path(), &["add", "ok", "--tag", "not-a-tag"]);
    assert_eq!(err["error"]["error_code"], "E2002");
}

#[test]
fn human_errors_go_to_stderr_with_code() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path(), SAMPLE);

    clilog_cmd(dir.path())
        .args(["delete", "5", "--format", "text"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("error[E2001]"))
        .stderr(predicate::str::contains("suggestion:"));
}

#[test]
fn broken_config_reports_config_code() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("config.toml"), "[log\nformat = ").expect("write config");
    let err = error_of(dir.path(), &["list"]);
    assert_eq!(err["error"]["error_code"], "E1002");
}

// ---------------------------------------------------------------------------
// Mirror
// ---------------------------------------------------------------------------

#[test]
fn sync_and_query_through_mirror() {
    let dir = TempDir::new().expect("tempdir");
    seed(
        dir.path(),
        "[ ] (2024-01-01 10:00) Buy milk #errand\n\
         not a note\n\
         [ ] (2024-01-03 08:00) File taxes [DUE:2024-04-15] #bills\n\
         [X] (2024-01-02 09:00) Pay rent #bills #urgent\n",
    );

    let report = json_of(dir.path(), &["sync"]);
    assert_eq!(report["rows_inserted"], 3);
    assert_eq!(report["skipped"], 1);

    let rows = json_of(
        dir.path(),
        &["query", "--tag", "bills", "--status", "pending", "--due-before", "2024-04-30"],
    );
    let rows = rows.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], 3);
    assert_eq!(rows[0]["text"], "File taxes");
    assert_eq!(rows[0]["due_date"], "2024-04-15");
}

#[test]
fn writes_refresh_the_mirror_automatically() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    json_of(dir.path(), &["add", "first #a"]);
    json_of(dir.path(), &["add", "second #b"]);

    let rows = json_of(dir.path(), &["query", "--tag", "b"]);
    assert_eq!(rows.as_array().map(Vec::len), Some(1));

    json_of(dir.path(), &["delete", "1"]);
    let rows = json_of(dir.path(), &["query"]);
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["text"], "second");
}

#[test]
fn sync_without_log_fails_with_read_code() {
    let dir = TempDir::new().expect("tempdir");
    let err = error_of(dir.path(), &["sync"]);
    assert_eq!(err["error"]["error_code"], "E3001");
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

#[test]
fn stats_count_statuses() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path(), SAMPLE);
    let stats = json_of(dir.path(), &["stats"]);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["pending"], 1);
    assert_eq!(stats["completed"], 1);
}

#[test]
fn stats_from_mirror_after_sync() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path(), SAMPLE);
    json_of(dir.path(), &["sync"]);
    let stats = json_of(dir.path(), &["stats", "--mirror"]);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["completed"], 1);
}

#[test]
fn export_document_shape() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path(), SAMPLE);

    let output = clilog_cmd(dir.path())
        .arg("export")
        .output()
        .expect("export should not crash");
    assert!(output.status.success());
    let doc: Value = serde_json::from_slice(&output.stdout).expect("export is JSON");
    assert_eq!(doc["total_notes"], 2);
    assert!(doc["export_date"].as_str().is_some_and(|d| !d.is_empty()));
    assert_eq!(doc["notes"][1]["raw"], "[X] (2024-01-02 09:00) Pay rent #bills #urgent");

    let target = dir.path().join("out.json");
    clilog_cmd(dir.path())
        .args(["export", "--output"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    let written: Value =
        serde_json::from_str(&fs::read_to_string(&target).expect("read export")).expect("JSON");
    assert_eq!(written["notes"][0]["text"], "Buy milk");
}

#[test]
fn numbered_format_from_config() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("config.toml"), "[log]\nformat = \"numbered\"\n").expect("config");
    seed(dir.path(), "4. [ ] | Due: 2024-05-01 | (2024-01-01 10:00) Renew passport #admin\n");

    let added = json_of(dir.path(), &["add", "Book flights"]);
    assert_eq!(added["id"], 2);
    assert_eq!(added["seq"], 5);

    let list = json_of(dir.path(), &["list"]);
    assert_eq!(list[0]["due_date"], "2024-05-01");
    assert!(list[1]["raw"].as_str().is_some_and(|r| r.starts_with("5. [ ] | Due: - | (")));
}

#[test]
fn completions_do_not_need_a_data_dir() {
    let dir = TempDir::new().expect("tempdir");
    clilog_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("clilog"));
    assert!(!dir.path().join("notes.log").exists());
}

//! Position-keyed persistence for the note log.
//!
//! The log file is the source of truth. Every mutation follows the same
//! protocol:
//!
//! 1. Acquire the exclusive advisory lock (`<log>.lock`).
//! 2. Read and decode the whole file.
//! 3. Transform the decoded lines in memory.
//! 4. Write the result to `<log>.tmp`, flush, and `rename` it over the log.
//!
//! Reads take the shared lock, so a reader never observes a half-applied
//! mutation and two writers can never lose each other's update.
//!
//! # Invariants
//!
//! - Note ids are 1-based positions among decoded lines, recomputed on
//!   every read.
//! - Non-blank lines the codec cannot decode (including lines that are not
//!   valid UTF-8) are never listed, but their bytes are written back at
//!   their original relative position.
//! - Blank lines are dropped on rewrite.
//! - Appends never rewrite existing bytes (`O_APPEND`).

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::codec::{
    LineCodec, LogFormat, RawLine, is_valid_tag, local_now, split_inline_tags,
    split_physical_lines,
};
use crate::error::ErrorCode;
use crate::lock::{LockError, LogLock, lock_path_for};
use crate::model::note::{DueDate, Note, NoteStats, Status};

/// Default time to wait for the log lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by [`LogStore`] operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No decoded note sits at this position.
    #[error("note {id} not found")]
    NotFound { id: usize },

    /// Note text was empty or spanned several lines.
    #[error("invalid note text: {0}")]
    InvalidText(&'static str),

    /// A tag contained something other than word characters.
    #[error("invalid tag {0:?}: tags may only contain letters, digits, and '_'")]
    InvalidTag(String),

    /// The largest sequence number in a numbered log has no successor.
    #[error("sequence number {max} is the largest possible; cannot number a new note")]
    SequenceExhausted { max: u64 },

    #[error("failed to read log {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write log {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Lock(#[from] LockError),
}

impl StoreError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NoteNotFound,
            Self::InvalidText(_) | Self::InvalidTag(_) => ErrorCode::InvalidNote,
            Self::SequenceExhausted { .. } => ErrorCode::SequenceExhausted,
            Self::Read { .. } => ErrorCode::LogReadFailed,
            Self::Write { .. } => ErrorCode::LogWriteFailed,
            Self::Lock(err) => err.code(),
        }
    }
}

// ---------------------------------------------------------------------------
// Line model
// ---------------------------------------------------------------------------

/// One non-blank physical line of the log.
#[derive(Debug, Clone)]
enum LogLine {
    Note(Note),
    /// A line no grammar accepts, kept as raw bytes.
    Opaque(Vec<u8>),
}

impl LogLine {
    fn as_persisted(&self) -> &[u8] {
        match self {
            Self::Note(note) => note.raw.as_bytes(),
            Self::Opaque(raw) => raw,
        }
    }
}

/// Decode file content into lines, assigning position ids to notes.
fn decode_content(content: &[u8], codec: &dyn LineCodec) -> Vec<LogLine> {
    let mut lines = Vec::new();
    let mut position = 0;

    for (idx, line) in split_physical_lines(content).enumerate() {
        if line.is_blank() {
            continue;
        }
        let decoded = match line {
            RawLine::Text(text) => codec.decode(text),
            RawLine::Binary(_) => None,
        };
        if let Some(mut note) = decoded {
            position += 1;
            note.id = position;
            lines.push(LogLine::Note(note));
        } else {
            debug!(line_no = idx + 1, "skipping unparseable log line");
            lines.push(LogLine::Opaque(line.trimmed_bytes().to_vec()));
        }
    }

    lines
}

fn notes_of(lines: Vec<LogLine>) -> Vec<Note> {
    lines
        .into_iter()
        .filter_map(|line| match line {
            LogLine::Note(note) => Some(note),
            LogLine::Opaque(_) => None,
        })
        .collect()
}

fn find_note_mut(lines: &mut [LogLine], id: usize) -> Option<&mut Note> {
    lines.iter_mut().find_map(|line| match line {
        LogLine::Note(note) if note.id == id => Some(note),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

/// Split inline tags out of caller text, then validate what remains.
fn normalize_text(text: &str) -> Result<(String, Vec<String>), StoreError> {
    if text.contains(['\n', '\r']) {
        return Err(StoreError::InvalidText("text must be a single line"));
    }
    let (text, inline_tags) = split_inline_tags(text);
    if text.is_empty() {
        return Err(StoreError::InvalidText("text must not be empty"));
    }
    Ok((text, inline_tags))
}

/// Strip an optional leading `#` and reject anything that is not `\w+`.
fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Result<Vec<String>, StoreError> {
    tags.iter()
        .map(|tag| {
            let tag = tag.as_ref().trim();
            let body = tag.strip_prefix('#').unwrap_or(tag);
            if is_valid_tag(body) {
                Ok(body.to_string())
            } else {
                Err(StoreError::InvalidTag(tag.to_string()))
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// LogStore
// ---------------------------------------------------------------------------

/// Whole-file, position-keyed store over a note log.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
    lock_path: PathBuf,
    format: LogFormat,
    lock_timeout: Duration,
    durable: bool,
}

impl LogStore {
    /// Create a store for the log at `path` using the given line grammar.
    ///
    /// Nothing is touched on disk until the first operation.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, format: LogFormat) -> Self {
        let path = path.into();
        Self {
            lock_path: lock_path_for(&path),
            path,
            format,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            durable: false,
        }
    }

    /// Override how long operations wait for the log lock.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// When set, every write is followed by `fsync`.
    #[must_use]
    pub fn with_durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }

    fn codec(&self) -> &'static dyn LineCodec {
        self.format.codec()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// All decoded notes in file order, ids `1..=n`.
    ///
    /// A missing log file yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the file exists but cannot be read, or
    /// [`StoreError::Lock`] if a writer holds the lock past the timeout.
    pub fn list(&self) -> Result<Vec<Note>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let _lock = LogLock::shared(&self.lock_path, self.lock_timeout)?;
        Ok(notes_of(self.read_lines()?))
    }

    /// The note currently at position `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no note has that position, plus
    /// the errors of [`list`](Self::list).
    pub fn get(&self, id: usize) -> Result<Note, StoreError> {
        self.list()?
            .into_iter()
            .find(|note| note.id == id)
            .ok_or(StoreError::NotFound { id })
    }

    /// Total / pending / completed counts.
    ///
    /// # Errors
    ///
    /// Same as [`list`](Self::list).
    pub fn stats(&self) -> Result<NoteStats, StoreError> {
        Ok(NoteStats::from_notes(&self.list()?))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Append a new pending note as the last line.
    ///
    /// `#word` tokens inside `text` are lifted into the tag list ahead of
    /// `tags`. For the `numbered` format the new line's sequence number is
    /// one past the largest existing one.
    ///
    /// Returns the note as it will be listed, including its position id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidText`] / [`StoreError::InvalidTag`] for
    /// bad input, [`StoreError::Lock`] on contention, and
    /// [`StoreError::Read`] / [`StoreError::Write`] on I/O failure.
    pub fn append<S: AsRef<str>>(&self, text: &str, tags: &[S]) -> Result<Note, StoreError> {
        let (text, mut all_tags) = normalize_text(text)?;
        all_tags.extend(normalize_tags(tags)?);

        let _lock = LogLock::exclusive(&self.lock_path, self.lock_timeout)?;
        let existing = notes_of(self.read_lines()?);

        let codec = self.codec();
        let mut note = Note::pending(text, all_tags);
        note.id = existing.len() + 1;
        note.timestamp = Some(local_now());
        if codec.embeds_sequence() {
            let max = existing.iter().filter_map(|n| n.seq).max().unwrap_or(0);
            note.seq = Some(max.checked_add(1).ok_or(StoreError::SequenceExhausted { max })?);
        }
        if codec.embeds_due() {
            note.due = Some(DueDate::Unset);
        }
        note.raw = codec.encode(&note);
        self.append_line(&note.raw)?;

        // Report the line the way `list` will read it back.
        let id = note.id;
        let mut listed = codec.decode(&note.raw).unwrap_or(note);
        listed.id = id;
        debug!(id, seq = ?listed.seq, "appended note");
        Ok(listed)
    }

    /// Replace the text (and optionally the status) of the note at `id`.
    ///
    /// Tags, due date, sequence number, and creation timestamp are kept.
    /// `#word` tokens in `new_text` are appended to the existing tags.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] without touching the file when `id`
    /// is not a current position; otherwise as [`append`](Self::append).
    pub fn update(
        &self,
        id: usize,
        new_text: &str,
        new_status: Option<Status>,
    ) -> Result<Note, StoreError> {
        let (text, extra_tags) = normalize_text(new_text)?;
        self.modify(id, |note| {
            note.text = text;
            note.tags.extend(extra_tags);
            if let Some(status) = new_status {
                note.status = status;
            }
        })
    }

    /// Set the status of the note at `id`, keeping its text.
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub fn set_status(&self, id: usize, status: Status) -> Result<Note, StoreError> {
        self.modify(id, |note| note.status = status)
    }

    /// Remove the note at `id`; later notes shift down by one.
    ///
    /// Returns the removed note, or `None` when no note has that position
    /// (the file is then left untouched).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Lock`], [`StoreError::Read`], or
    /// [`StoreError::Write`].
    pub fn delete(&self, id: usize) -> Result<Option<Note>, StoreError> {
        let _lock = LogLock::exclusive(&self.lock_path, self.lock_timeout)?;
        let mut lines = self.read_lines()?;

        let Some(index) = lines
            .iter()
            .position(|line| matches!(line, LogLine::Note(note) if note.id == id))
        else {
            debug!(id, "delete target not present; nothing to do");
            return Ok(None);
        };

        let LogLine::Note(removed) = lines.remove(index) else {
            return Ok(None);
        };
        self.rewrite(&lines)?;
        debug!(id, "deleted note");
        Ok(Some(removed))
    }

    /// Read-modify-rewrite a single note under the exclusive lock.
    fn modify(&self, id: usize, change: impl FnOnce(&mut Note)) -> Result<Note, StoreError> {
        let _lock = LogLock::exclusive(&self.lock_path, self.lock_timeout)?;
        let mut lines = self.read_lines()?;
        let codec = self.codec();

        let note = find_note_mut(&mut lines, id).ok_or(StoreError::NotFound { id })?;
        change(note);
        note.raw = codec.encode(note);
        let updated = note.clone();

        self.rewrite(&lines)?;
        debug!(id, status = %updated.status, "updated note");
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // File I/O (caller holds the lock)
    // -----------------------------------------------------------------------

    fn read_lines(&self) -> Result<Vec<LogLine>, StoreError> {
        match fs::read(&self.path) {
            Ok(content) => Ok(decode_content(&content, self.codec())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_error(&self, source: io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }

    /// Append one line with `O_APPEND`, repairing a missing trailing newline.
    fn append_line(&self, line: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;

        let mut payload = String::with_capacity(line.len() + 2);
        if needs_newline(&mut file).map_err(|e| self.write_error(e))? {
            payload.push('\n');
        }
        payload.push_str(line);
        payload.push('\n');

        file.write_all(payload.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| self.write_error(e))?;
        if self.durable {
            file.sync_data().map_err(|e| self.write_error(e))?;
        }
        Ok(())
    }

    /// Replace the whole log via a temp file and `rename`.
    fn rewrite(&self, lines: &[LogLine]) -> Result<(), StoreError> {
        let mut body = Vec::new();
        for line in lines {
            body.extend_from_slice(line.as_persisted());
            body.push(b'\n');
        }

        let tmp_path = tmp_path_for(&self.path);
        if let Err(source) = write_and_swap(&tmp_path, &self.path, &body, self.durable) {
            let _ = fs::remove_file(&tmp_path);
            return Err(self.write_error(source));
        }
        Ok(())
    }
}

/// Write `body` to `tmp_path`, then atomically move it over `path`.
fn write_and_swap(tmp_path: &Path, path: &Path, body: &[u8], durable: bool) -> io::Result<()> {
    let mut tmp = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(tmp_path)?;
    tmp.write_all(body)?;
    tmp.flush()?;
    if durable {
        tmp.sync_all()?;
    }
    fs::rename(tmp_path, path)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// True when the file is non-empty and its last byte is not `\n`.
fn needs_newline(file: &mut fs::File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

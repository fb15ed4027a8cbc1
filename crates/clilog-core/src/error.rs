use std::fmt;

/// Machine-readable error codes surfaced by the CLI and any other caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    NoteNotFound,
    InvalidNote,
    SequenceExhausted,
    LogReadFailed,
    MirrorUnavailable,
    RebuildDeadlineExceeded,
    LogWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::NoteNotFound => "E2001",
            Self::InvalidNote => "E2002",
            Self::SequenceExhausted => "E2003",
            Self::LogReadFailed => "E3001",
            Self::MirrorUnavailable => "E3002",
            Self::RebuildDeadlineExceeded => "E3003",
            Self::LogWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Optional remediation hint for the person at the terminal.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in config.toml and retry."),
            Self::NoteNotFound => Some("Run `clilog list` to see current note ids; ids shift after deletes."),
            Self::InvalidNote => Some("Use single-line text and tags made of letters, digits, or `_`."),
            Self::SequenceExhausted => {
                Some("Renumber the log so its largest sequence number is below the u64 limit.")
            }
            Self::LogReadFailed => Some("Check that the log file exists and is readable."),
            Self::MirrorUnavailable => Some("Check the mirror path and permissions, then run `clilog sync`."),
            Self::RebuildDeadlineExceeded => {
                Some("Raise mirror.rebuild_deadline_ms in config.toml and run `clilog sync` again.")
            }
            Self::LogWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `clilog` process releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

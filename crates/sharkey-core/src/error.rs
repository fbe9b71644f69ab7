use thiserror::Error;

pub type SharkeyResult<T> = Result<T, SharkeyError>;

#[derive(Debug, Error)]
pub enum SharkeyError {
    #[error("{what} must be exactly {expected} bytes long (got {actual} bytes)")]
    Length {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("format error: {0}")]
    Format(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unable to combine shares: {0}")]
    Combine(String),

    #[error("fatal consistency error: {0}")]
    FatalConsistency(String),

    #[error("key stretching failed: {0}")]
    Stretch(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("aborted by user")]
    Aborted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fieldless discriminant of [`SharkeyError`], for callers that branch on
/// the kind of failure rather than its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Length,
    Format,
    Validation,
    Combine,
    FatalConsistency,
    Stretch,
    Config,
    Aborted,
    Io,
}

impl SharkeyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SharkeyError::Length { .. } => ErrorKind::Length,
            SharkeyError::Format(_) => ErrorKind::Format,
            SharkeyError::Validation(_) => ErrorKind::Validation,
            SharkeyError::Combine(_) => ErrorKind::Combine,
            SharkeyError::FatalConsistency(_) => ErrorKind::FatalConsistency,
            SharkeyError::Stretch(_) => ErrorKind::Stretch,
            SharkeyError::Config(_) => ErrorKind::Config,
            SharkeyError::Aborted => ErrorKind::Aborted,
            SharkeyError::Io(_) => ErrorKind::Io,
        }
    }

    /// Errors a human can fix by supplying different input at the same
    /// prompt. Everything else ends the current attempt.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Format | ErrorKind::Validation)
    }

    pub(crate) fn length(what: &'static str, expected: usize, actual: usize) -> Self {
        SharkeyError::Length {
            what,
            expected,
            actual,
        }
    }
}

/// Check that `bytes` is exactly `expected` long.
pub fn ensure_len(what: &'static str, bytes: &[u8], expected: usize) -> SharkeyResult<()> {
    if bytes.len() != expected {
        return Err(SharkeyError::length(what, expected, bytes.len()));
    }
    Ok(())
}

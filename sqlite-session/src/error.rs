//! Error types for the `SQLite` session wrapper.

use std::fmt;

use thiserror::Error;

use crate::engine::codes;

/// Result code reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    /// Primary result code (extended result codes carry extra bits above the
    /// low byte).
    #[must_use]
    pub const fn primary(self) -> i32 {
        self.0 & 0xff
    }

    /// Returns `true` for `SQLITE_BUSY` and its extended variants.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        self.primary() == codes::BUSY
    }

    /// Returns `true` for `SQLITE_CONSTRAINT` and its extended variants.
    #[must_use]
    pub const fn is_constraint(self) -> bool {
        self.primary() == codes::CONSTRAINT
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned by every fallible session operation.
///
/// Carries the raw engine code and the message the engine reported at the
/// time of failure, so callers can tell failure categories apart without
/// going back to the handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sqlite error {code}: {message}")]
pub struct ConnectionError {
    /// Engine result code.
    pub code: ErrorCode,
    /// Human-readable message (from `sqlite3_errmsg` when available).
    pub message: String,
}

impl ConnectionError {
    /// Creates a new connection error.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode(code),
            message: message.into(),
        }
    }

    /// Error for operations that need an open connection.
    pub(crate) fn not_open() -> Self {
        Self::new(codes::MISUSE, "session is not open")
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, ConnectionError>;

//! Relay error types with stable wire kinds.
//!
//! [`RelayError`] is the central error type for the relay. Each variant maps
//! to a snake_case kind string that is sent to the originating client inside
//! an `error` event when a handler fails.

use std::path::PathBuf;

use serde::Serialize;

/// Payload of the outbound `error` event.
///
/// ```json
/// { "kind": "file_not_found", "message": "file not found: part.gcode" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable error kind.
    pub kind: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum.
///
/// | Kind              | Raised by                                   |
/// |-------------------|---------------------------------------------|
/// | `invalid_payload` | malformed inbound frames                    |
/// | `file_not_found`  | parser, when the motion file is missing     |
/// | `parse_error`     | parser, on unreadable motion words          |
/// | `io_error`        | file reads and artifact writes              |
/// | `internal`        | worker shutdown, panicked blocking tasks    |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Inbound frame had the wrong type or shape.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Motion file does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Motion file could not be interpreted.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// Zero-based source line index.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Reading or writing a file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal failure (worker gone, blocking task aborted).
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the stable kind string for this variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "invalid_payload",
            Self::FileNotFound(_) => "file_not_found",
            Self::Parse { .. } => "parse_error",
            Self::Io(_) => "io_error",
            Self::Internal(_) => "internal",
        }
    }

    /// Builds the body of the outbound `error` event.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

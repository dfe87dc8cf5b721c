//! Error types for REST coverage analysis.

use std::{error::Error, fmt, io};

/// Error type for fatal coverage failures.
///
/// Per-request mismatches are not errors; they are collected as
/// [`Diagnostic`](crate::Diagnostic) values instead.
#[derive(Debug)]
pub enum CoverageError {
    /// An underlying I/O error.
    Io(io::Error),
    /// JSON (de)serialization failed outside of audit records and request bodies.
    Json(serde_json::Error),
    /// The schema document could not be understood.
    Schema(String),
    /// An audit log record failed structural deserialization.
    AuditEvent {
        /// 1-based line number of the record.
        line: usize,
        /// Parser error.
        source: serde_json::Error,
    },
    /// A request body is not valid JSON.
    RequestBody {
        /// Lower-case HTTP method of the matched endpoint.
        method: String,
        /// Path template of the matched endpoint.
        path: String,
        /// Parser error.
        source: serde_json::Error,
    },
    /// A catch-all error with a message.
    Other(String),
}

impl fmt::Display for CoverageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::Schema(message) => write!(f, "invalid swagger document: {message}"),
            Self::AuditEvent { line, source } => {
                write!(f, "invalid audit event at line {line}: {source}")
            }
            Self::RequestBody {
                method,
                path,
                source,
            } => write!(f, "invalid requestObject for '{method} {path}': {source}"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl Error for CoverageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::AuditEvent { source, .. } | Self::RequestBody { source, .. } => Some(source),
            Self::Schema(_) | Self::Other(_) => None,
        }
    }
}

impl From<io::Error> for CoverageError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CoverageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Convenience result type for coverage operations.
pub type Result<T> = std::result::Result<T, CoverageError>;

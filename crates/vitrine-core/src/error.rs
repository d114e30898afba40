//! Error types for Vitrine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a failed query, as reported to callers in the result envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The resource is not declared in the schema
    NotFound,
    /// A write violated a uniqueness rule
    Conflict,
    /// Malformed column, relationship, filter or select expression
    BadRequest,
    /// `single()` matched zero or more than one row
    SingleRowExpectationFailed,
    /// The backing store failed for reasons opaque to the façade
    Backend,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "NotFound"),
            ErrorKind::Conflict => write!(f, "Conflict"),
            ErrorKind::BadRequest => write!(f, "BadRequest"),
            ErrorKind::SingleRowExpectationFailed => write!(f, "SingleRowExpectationFailed"),
            ErrorKind::Backend => write!(f, "Backend"),
        }
    }
}

/// The main error type for Vitrine operations.
#[derive(Debug)]
pub enum Error {
    /// A lock was poisoned (internal error)
    LockPoisoned,

    /// I/O error
    Io(std::io::Error),

    /// Serialization/deserialization error
    Serialization(String),

    /// Stored data failed an integrity check
    Corruption(String),

    /// Unknown resource
    NotFound(String),

    /// Uniqueness violation on write
    Conflict(String),

    /// Invalid column, relationship or expression
    BadRequest(String),

    /// A single-row fetch matched `rows` rows
    SingleRow {
        /// Number of rows the query actually matched
        rows: usize,
    },

    /// Backend failure
    Backend(String),
}

impl Error {
    /// Maps this error onto the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::BadRequest(_) => ErrorKind::BadRequest,
            Error::SingleRow { .. } => ErrorKind::SingleRowExpectationFailed,
            Error::LockPoisoned
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::Corruption(_)
            | Error::Backend(_) => ErrorKind::Backend,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LockPoisoned => write!(f, "Lock poisoned"),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Corruption(msg) => write!(f, "Corruption: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::Conflict(msg) => write!(f, "Conflict: {}", msg),
            Error::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Error::SingleRow { rows } => {
                write!(f, "Expected exactly one row but got {}", rows)
            }
            Error::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// A specialized `Result` type for Vitrine operations.
pub type Result<T> = std::result::Result<T, Error>;

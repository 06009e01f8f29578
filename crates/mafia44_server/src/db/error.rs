//! Storage error type.

use derive_more::{Display, Error};
use tracing::instrument;

/// Which layer of storage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DbErrorKind {
    /// The database could not be opened or configured.
    #[display("connection")]
    Connection,
    /// Applying the embedded migrations failed.
    #[display("migration")]
    Migration,
    /// A statement failed.
    #[display("query")]
    Query,
    /// Stored rows do not describe a valid room or game, or a write refers
    /// to one that does not exist.
    #[display("inconsistent data")]
    Inconsistent,
}

/// Storage error with the location that raised it.
#[derive(Debug, Clone, Display, Error)]
#[display("Storage error ({}): {} at {}:{}", kind, message, file, line)]
pub struct DbError {
    /// Failing layer.
    pub kind: DbErrorKind,
    /// Error message.
    pub message: String,
    /// Line that raised the error.
    pub line: u32,
    /// File that raised the error.
    pub file: &'static str,
}

impl DbError {
    /// An inconsistency error at the caller's location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(DbErrorKind::Inconsistent, message)
    }

    /// An error of the given kind at the caller's location.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn with_kind(kind: DbErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::with_kind(DbErrorKind::Query, err.to_string())
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::with_kind(DbErrorKind::Connection, err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("Stored card array is malformed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_records_caller_line() {
        let line = line!() + 1;
        let err = DbError::new("Room 3 has no game");
        assert_eq!(err.line, line);
        assert!(err.file.ends_with("error.rs"));
        assert_eq!(err.kind, DbErrorKind::Inconsistent);
    }

    #[test]
    fn test_diesel_errors_are_queries() {
        let err = DbError::from(diesel::result::Error::NotFound);
        assert_eq!(err.kind, DbErrorKind::Query);
        assert!(err.to_string().starts_with("Storage error (query)"));
    }
}

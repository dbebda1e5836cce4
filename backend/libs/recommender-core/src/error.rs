//! Error types for the recommender core

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::UserId;

pub type Result<T> = std::result::Result<T, RecommenderError>;

/// Recommender errors
#[derive(Error, Debug)]
pub enum RecommenderError {
    /// The rating source could not be opened or read
    #[error("Rating source unavailable: {}: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rating record failed to parse or violated a store invariant
    #[error("Malformed rating record at line {line}: {reason}")]
    DataFormat { line: usize, reason: String },

    /// The queried user has no ratings in the store
    #[error("No such user: {0}")]
    UnknownUser(UserId),

    /// Caller supplied an out-of-range id, count or parameter
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Stable, serializable discriminant of [`RecommenderError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SourceUnavailable,
    DataFormat,
    UnknownUser,
    InvalidQuery,
}

/// Structured error result handed to the caller layer
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl RecommenderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecommenderError::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            RecommenderError::DataFormat { .. } => ErrorKind::DataFormat,
            RecommenderError::UnknownUser(_) => ErrorKind::UnknownUser,
            RecommenderError::InvalidQuery(_) => ErrorKind::InvalidQuery,
        }
    }

    /// Whether the caller should treat this as a per-query condition rather than a fatal one
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RecommenderError::UnknownUser(_) | RecommenderError::InvalidQuery(_)
        )
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    pub(crate) fn data_format(line: usize, reason: impl Into<String>) -> Self {
        RecommenderError::DataFormat {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_query(reason: impl Into<String>) -> Self {
        RecommenderError::InvalidQuery(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RecommenderError::data_format(3, "missing rating field");
        assert_eq!(
            err.to_string(),
            "Malformed rating record at line 3: missing rating field"
        );

        let err = RecommenderError::UnknownUser(42);
        assert_eq!(err.to_string(), "No such user: 42");
    }

    #[test]
    fn test_source_unavailable_display_includes_path() {
        let err = RecommenderError::SourceUnavailable {
            path: PathBuf::from("/nope/data.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/nope/data.csv"));
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(RecommenderError::UnknownUser(1).is_recoverable());
        assert!(RecommenderError::invalid_query("count").is_recoverable());
        assert!(!RecommenderError::data_format(1, "x").is_recoverable());
    }

    #[test]
    fn test_report_serialization() {
        let report = RecommenderError::UnknownUser(7).report();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["kind"], "unknown_user");
        assert_eq!(json["message"], "No such user: 7");
    }
}

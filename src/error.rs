//! Error types shared by the query, index and coordinator layers.
//!
//! Query errors are values the caller decides what to do with. Backend
//! errors end an interactive session.

use crate::query::ParseError;
use thiserror::Error;

/// Failure of the underlying full-text engine or the files feeding it.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Error returned by a search callback.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query string could not be compiled. Recoverable.
    #[error(transparent)]
    Query(#[from] ParseError),

    /// The engine failed. Fatal for the session.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SearchError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SearchError::Backend(_))
    }
}

impl From<tantivy::TantivyError> for SearchError {
    fn from(e: tantivy::TantivyError) -> Self {
        SearchError::Backend(BackendError::Index(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_errors_are_recoverable() {
        let err = SearchError::from(ParseError::new("unterminated quote", 4));
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "unterminated quote at 4");
    }

    #[test]
    fn test_backend_errors_are_fatal() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = SearchError::from(BackendError::from(io));
        assert!(err.is_fatal());
        assert!(err.to_string().contains("disk gone"));
    }
}

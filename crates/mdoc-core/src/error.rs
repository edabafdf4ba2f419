//! Error types and handling for mdoc-core operations.
//!
//! All public functions in mdoc-core return [`Result<T, Error>`]. Errors are
//! categorized for logging and recovery logic; only I/O-facing operations
//! (document loading, index builds) are expected to fail at runtime, while
//! parsing and outline extraction degrade instead of erroring.

use thiserror::Error;

/// The main error type for mdoc-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed (reading documents, config files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing setup failed (grammar loading). Malformed markdown itself
    /// never produces this - the parser degrades to a best-effort event
    /// stream instead.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Search index operation failed (build, commit, document retrieval).
    #[error("Index error: {0}")]
    Index(String),

    /// The query string was rejected by the query parser.
    ///
    /// Kept distinct from an empty result list so hosts can tell
    /// "no matches" apart from "bad query".
    #[error("Invalid query: {0}")]
    Query(String),

    /// Requested resource was not found (index document, project root).
    #[error("Not found: {0}")]
    NotFound(String),

    /// URL is malformed or could not be resolved against the project base.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failed (TOML, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// Load and build failures caused by transient I/O are worth retrying;
    /// parse, query and configuration errors are permanent.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a static string identifier, for logging
    /// and metrics grouping.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Parse(_) => "parse",
            Self::Index(_) => "index",
            Self::Query(_) => "query",
            Self::NotFound(_) => "not_found",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn display_includes_message() {
        let err = Error::Query("unbalanced parenthesis".into());
        let text = err.to_string();
        assert!(text.contains("Invalid query"));
        assert!(text.contains("unbalanced parenthesis"));
    }

    #[test]
    fn categories_are_stable() {
        let cases = vec![
            (Error::Io(io::Error::other("x")), "io"),
            (Error::Parse("x".into()), "parse"),
            (Error::Index("x".into()), "index"),
            (Error::Query("x".into()), "query"),
            (Error::NotFound("x".into()), "not_found"),
            (Error::InvalidUrl("x".into()), "invalid_url"),
            (Error::Config("x".into()), "config"),
            (Error::Serialization("x".into()), "serialization"),
        ];
        for (err, category) in cases {
            assert_eq!(err.category(), category);
        }
    }

    #[test]
    fn recoverability() {
        assert!(Error::Io(io::Error::new(io::ErrorKind::TimedOut, "t")).is_recoverable());
        assert!(Error::Io(io::Error::new(io::ErrorKind::Interrupted, "i")).is_recoverable());
        assert!(!Error::Io(io::Error::new(io::ErrorKind::NotFound, "n")).is_recoverable());
        assert!(!Error::Query("bad".into()).is_recoverable());
        assert!(!Error::Index("corrupt".into()).is_recoverable());
    }

    #[test]
    fn io_error_keeps_source_chain() {
        let err: Error = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("denied"));
    }
}

//! XML Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An XML error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for XML operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The text is not well-formed XML.
    #[display("malformed XML: {_0}")]
    Parse(#[error(not(source))] String),
    /// The XML is well-formed but is not an article document (no `front/article-meta`).
    #[display("invalid article document: missing {_0}")]
    InvalidDocument(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The XML is either well-formed or it isn't.
        false
    }
}

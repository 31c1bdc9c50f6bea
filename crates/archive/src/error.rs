//! Archive Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An I/O operation on the package file failed.
    #[display("I/O error")]
    Io,
    /// The package is not a valid zip archive, or an entry could not be written.
    #[display("invalid zip archive")]
    Zip,
    /// One or more XML entries are not valid UTF-8. Lists every failing entry.
    #[display("undecodable entries: {_0}")]
    Decode(#[error(not(source))] String),
    /// The path is neither a `.zip` archive nor an `.xml` file.
    #[display("unsupported package: {_0}")]
    Unsupported(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Io.to_string(), "I/O error");
        assert_eq!(
            ErrorKind::Decode("a.xml (invalid utf-8)".to_string()).to_string(),
            "undecodable entries: a.xml (invalid utf-8)"
        );
        assert_eq!(ErrorKind::Unsupported("a.tar".to_string()).to_string(), "unsupported package: a.tar");
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Io.is_retryable());
        assert!(!ErrorKind::Zip.is_retryable());
        assert!(!ErrorKind::Decode(String::new()).is_retryable());
    }
}

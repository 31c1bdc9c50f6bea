//! Provider Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Errors of the registry, archive and
//! XML crates are raised into these kinds, keeping their frames as children.

use derive_more::{Display, Error};
use pidr_registry::error::{Error as RegistryError, ErrorKind as RegistryErrorKind};

/// A provider error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
///
/// ### Per-entry Errors
/// - [`ErrorKind::Extraction`]: the entry is skipped and listed in the manifest.
///
/// ### Per-request Errors
/// Everything else aborts the request.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No document is registered under the given `v3`.
    #[display("document not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The registry could not be reached. The only retryable kind.
    #[display("unable to reach the registry")]
    Connect,
    /// A new document could not be registered.
    #[display("unable to register document")]
    Create,
    /// A write collided with an existing registration that could not be found
    /// again afterwards.
    #[display("document identifiers are not unique")]
    NotUnique,
    /// A registry lookup failed.
    #[display("unable to fetch document")]
    Fetch,
    /// The source package is unreadable or contains no XML document.
    #[display("invalid input package")]
    InputData,
    /// The written output package does not hold exactly the resolved documents.
    #[display("invalid output package")]
    InvalidPackage,
    /// Not every document of the package was accounted for.
    #[display("incomplete processing: documents were lost")]
    Conclusion,
    /// The named entry is not a well-formed article document.
    #[display("unable to extract document: {_0}")]
    Extraction(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect)
    }

    /// Raises a registry error: lost connectivity stays [`ErrorKind::Connect`],
    /// anything else becomes `otherwise`.
    #[track_caller]
    pub(crate) fn registry(err: RegistryError, otherwise: ErrorKind) -> Error {
        let kind = match &*err {
            RegistryErrorKind::Connect => Self::Connect,
            _ => otherwise,
        };
        err.raise(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Connect, true)]
    #[case(ErrorKind::Create, false)]
    #[case(ErrorKind::Fetch, false)]
    #[case(ErrorKind::InputData, false)]
    #[case(ErrorKind::Extraction("a.xml".to_string()), false)]
    fn retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }

    #[test]
    fn registry_errors_keep_connectivity() {
        let err = ErrorKind::registry(exn::Exn::from(RegistryErrorKind::Connect), ErrorKind::Fetch);
        assert_eq!(*err, ErrorKind::Connect);
        let err = ErrorKind::registry(exn::Exn::from(RegistryErrorKind::Database), ErrorKind::Fetch);
        assert_eq!(*err, ErrorKind::Fetch);
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::NotFound("abc".to_string()).to_string(), "document not found: abc");
        assert_eq!(ErrorKind::Extraction("a.xml".to_string()).to_string(), "unable to extract document: a.xml");
    }
}

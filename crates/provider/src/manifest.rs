//! The report of one package-processing request.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

use pidr_xml::models::ArticleIds;

use crate::error::Error;

/// How an entry's identity was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// A new `v3` was minted and registered.
    Registered,
    /// An existing registration was reused (including after losing a race).
    Matched,
}
impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Registered => "registered",
            Self::Matched => "matched",
        })
    }
}

/// The identifiers written into a resolved document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedIds {
    pub v3: String,
    pub v2: Option<String>,
    pub aop_pid: Option<String>,
}

/// A successfully resolved entry of the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Entry name inside the package (kept in the output package).
    pub name: String,
    /// Identifiers the document carried before processing.
    pub previous: ArticleIds,
    pub ids: ResolvedIds,
    pub outcome: Outcome,
    /// Why the best-effort refresh of the registry record failed, if it did.
    pub refresh_error: Option<String>,
}
impl Display for Entry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name,
            self.ids.v3,
            self.ids.v2.as_deref().unwrap_or("-"),
            self.ids.aop_pid.as_deref().unwrap_or("-"),
            self.outcome,
        )?;
        if let Some(refresh_error) = &self.refresh_error {
            write!(f, "\t(not refreshed: {refresh_error})")?;
        }
        Ok(())
    }
}

/// An entry that could not be processed, with the cause.
#[derive(Debug)]
pub struct Failure {
    pub name: String,
    pub error: Error,
}

#[derive(Debug)]
pub struct RequestManifest {
    /// Path of the written output package.
    pub output: PathBuf,
    /// Resolved entries, in package (name) order.
    pub entries: Vec<Entry>,
    /// Entries skipped because they could not be extracted.
    pub failures: Vec<Failure>,
}
impl RequestManifest {
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.entries.iter().all(|entry| entry.refresh_error.is_none())
    }
}

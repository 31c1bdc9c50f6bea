//! SQLite registry of article documents and their persistent identifiers.
//!
//! The registry is the source of truth for identifier assignment: one row per
//! document identity, keyed by its `v3`. Legacy identifiers (`v2`, `aop_pid`)
//! and the content-derived [`IdentityKey`] are indexed to find a document
//! again on re-submission.

mod db;
pub mod error;
mod key;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::key::IdentityKey;
pub use crate::models::Document;
pub use crate::repo::Repository;

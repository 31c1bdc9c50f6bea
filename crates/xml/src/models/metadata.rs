use std::collections::BTreeMap;

use super::{ArticleIds, Author, Issue};

/// A DOI and the language of the article version it identifies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DoiWithLang {
    pub doi: String,
    pub lang: String,
}

/// An ISSN and its publication type (`ppub`/`epub`, or `print`/`electronic`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Issn {
    pub kind: String,
    pub value: String,
}

/// Descriptive metadata of an article: everything used to decide whether two
/// documents are the same document when no legacy identifier is available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub doi_with_lang: Vec<DoiWithLang>,
    pub issns: Vec<Issn>,
    pub issue: Issue,
    /// Authors in document order.
    pub authors: Vec<Author>,
    /// Collaboration (group author) name, empty if none.
    pub collab: String,
    /// Title per language.
    pub article_titles: BTreeMap<String, String>,
    /// First non-empty paragraph of the main body, empty if none.
    pub partial_body: String,
}

/// Everything extracted from an article document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub ids: ArticleIds,
    pub metadata: Metadata,
}

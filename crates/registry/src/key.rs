//! Content-derived identity of a document.
//!
//! Two submissions describe the same document when their normalized
//! descriptive metadata is equal. Normalization:
//!
//! - every string is trimmed and internal whitespace runs collapse to one space,
//! - DOIs are lower-cased (they are case-insensitive),
//! - DOI/language pairs and ISSNs are sorted (their order carries no meaning),
//! - titles are ordered by language,
//! - author order is kept (it is part of the document).
//!
//! The normalized material is serialized to JSON and digested with BLAKE3.

use std::fmt::{Display, Formatter, Result as FmtResult};

use exn::ResultExt;
use facet_json::to_string as to_json;
use pidr_xml::models::Metadata;
use pidr_xml::normalize_space as norm;

use crate::error::{ErrorKind, Result};
use crate::models::facet::{AuthorProxy, DoiProxy, IssnProxy, IssueProxy, TitleProxy};

#[derive(facet::Facet)]
struct KeyMaterial {
    dois: Vec<DoiProxy>,
    issns: Vec<IssnProxy>,
    issue: IssueProxy,
    authors: Vec<AuthorProxy>,
    collab: String,
    titles: Vec<TitleProxy>,
    partial_body: String,
}

impl From<&Metadata> for KeyMaterial {
    fn from(metadata: &Metadata) -> Self {
        let mut dois = metadata
            .doi_with_lang
            .iter()
            .map(|doi| (norm(&doi.doi).to_lowercase(), norm(&doi.lang).to_lowercase()))
            .collect::<Vec<_>>();
        dois.sort();
        dois.dedup();
        let mut issns = metadata
            .issns
            .iter()
            .map(|issn| (norm(&issn.kind), norm(&issn.value).to_uppercase()))
            .collect::<Vec<_>>();
        issns.sort();
        issns.dedup();
        let issue = &metadata.issue;
        Self {
            dois: dois.into_iter().map(|(doi, lang)| DoiProxy { doi, lang }).collect(),
            issns: issns.into_iter().map(|(kind, value)| IssnProxy { kind, value }).collect(),
            issue: IssueProxy {
                volume: norm(&issue.volume),
                number: norm(&issue.number),
                suppl: norm(&issue.suppl),
                fpage: norm(&issue.fpage),
                fpage_seq: norm(&issue.fpage_seq),
                lpage: norm(&issue.lpage),
                elocation_id: norm(&issue.elocation_id),
                pub_year: norm(&issue.pub_year),
            },
            authors: metadata
                .authors
                .iter()
                .map(|author| AuthorProxy {
                    surname: norm(&author.surname),
                    given_names: norm(&author.given_names),
                    prefix: norm(&author.prefix),
                    suffix: norm(&author.suffix),
                    orcid: norm(&author.orcid),
                })
                .collect(),
            collab: norm(&metadata.collab),
            // BTreeMap iteration is already ordered by language.
            titles: metadata
                .article_titles
                .iter()
                .map(|(lang, title)| TitleProxy { lang: norm(lang).to_lowercase(), title: norm(title) })
                .collect(),
            partial_body: norm(&metadata.partial_body),
        }
    }
}

/// Hex-encoded BLAKE3 digest of a document's normalized descriptive metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidData`] if the key material cannot be serialized.
    pub fn from_metadata(metadata: &Metadata) -> Result<Self> {
        let material = to_json(&KeyMaterial::from(metadata)).or_raise(|| ErrorKind::InvalidData("identity key"))?;
        Ok(Self(blake3::hash(material.as_bytes()).to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for IdentityKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl Display for IdentityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

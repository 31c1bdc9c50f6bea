use exn::ResultExt;
use facet_json::{from_str as from_json, to_string as to_json};
use pidr_xml::models::{self as xml, ArticleIds, Metadata};
use time::UtcDateTime;

use crate::IdentityKey;
use crate::error::{Error, ErrorKind, Result};
use crate::models::facet::{AuthorProxy, DoiProxy, IssnProxy, TitleProxy};

/// A registered document: its identifiers, the descriptive metadata it was
/// last submitted with, and the XML it was last returned as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub v3: String,
    pub v2: Option<String>,
    pub aop_pid: Option<String>,
    pub identity_key: IdentityKey,
    pub metadata: Metadata,
    /// Full XML text (preamble included) with the identifiers embedded.
    pub xml: String,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

impl Document {
    /// Prepares a new registry entry for `v3`, submitted by `requester`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidData`] if the identity key cannot be computed.
    pub fn new(v3: impl Into<String>, ids: &ArticleIds, metadata: Metadata, xml: impl Into<String>, requester: &str) -> Result<Self> {
        let now = UtcDateTime::now();
        Ok(Self {
            v3: v3.into(),
            v2: ids.v2.clone(),
            aop_pid: ids.aop_pid.clone(),
            identity_key: IdentityKey::from_metadata(&metadata)?,
            metadata,
            xml: xml.into(),
            created_by: requester.to_string(),
            updated_by: requester.to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct DocumentRow {
    pub(crate) v3: String,
    pub(crate) v2: Option<String>,
    pub(crate) aop_pid: Option<String>,
    pub(crate) identity_key: String,
    pub(crate) doi_with_lang: String,
    pub(crate) issns: String,
    pub(crate) authors: String,
    pub(crate) article_titles: String,
    pub(crate) volume: String,
    pub(crate) number: String,
    pub(crate) suppl: String,
    pub(crate) fpage: String,
    pub(crate) fpage_seq: String,
    pub(crate) lpage: String,
    pub(crate) elocation_id: String,
    pub(crate) pub_year: String,
    pub(crate) collab: String,
    pub(crate) partial_body: String,
    pub(crate) xml: String,
    pub(crate) created_by: String,
    pub(crate) updated_by: String,
    pub(crate) created_at: i64,
    pub(crate) updated_at: i64,
}
impl TryFrom<&Document> for DocumentRow {
    type Error = Error;
    fn try_from(document: &Document) -> Result<Self> {
        let metadata = &document.metadata;
        let dois = metadata.doi_with_lang.iter().map(DoiProxy::from).collect::<Vec<_>>();
        let issns = metadata.issns.iter().map(IssnProxy::from).collect::<Vec<_>>();
        let authors = metadata.authors.iter().map(AuthorProxy::from).collect::<Vec<_>>();
        let titles = metadata
            .article_titles
            .iter()
            .map(|(lang, title)| TitleProxy { lang: lang.clone(), title: title.clone() })
            .collect::<Vec<_>>();
        let issue = &metadata.issue;
        Ok(Self {
            v3: document.v3.clone(),
            v2: document.v2.clone(),
            aop_pid: document.aop_pid.clone(),
            identity_key: document.identity_key.to_string(),
            doi_with_lang: to_json(&dois).or_raise(|| ErrorKind::InvalidData("doi_with_lang"))?,
            issns: to_json(&issns).or_raise(|| ErrorKind::InvalidData("issns"))?,
            authors: to_json(&authors).or_raise(|| ErrorKind::InvalidData("authors"))?,
            article_titles: to_json(&titles).or_raise(|| ErrorKind::InvalidData("article_titles"))?,
            volume: issue.volume.clone(),
            number: issue.number.clone(),
            suppl: issue.suppl.clone(),
            fpage: issue.fpage.clone(),
            fpage_seq: issue.fpage_seq.clone(),
            lpage: issue.lpage.clone(),
            elocation_id: issue.elocation_id.clone(),
            pub_year: issue.pub_year.clone(),
            collab: metadata.collab.clone(),
            partial_body: metadata.partial_body.clone(),
            xml: document.xml.clone(),
            created_by: document.created_by.clone(),
            updated_by: document.updated_by.clone(),
            created_at: document.created_at.unix_timestamp(),
            updated_at: document.updated_at.unix_timestamp(),
        })
    }
}
impl TryFrom<DocumentRow> for Document {
    type Error = Error;
    fn try_from(row: DocumentRow) -> Result<Self> {
        Ok(Self {
            v3: row.v3,
            v2: row.v2,
            aop_pid: row.aop_pid,
            identity_key: IdentityKey::from(row.identity_key),
            metadata: Metadata {
                doi_with_lang: from_json::<Vec<DoiProxy>>(&row.doi_with_lang)
                    .or_raise(|| ErrorKind::InvalidData("doi_with_lang"))?
                    .into_iter()
                    .map(xml::DoiWithLang::from)
                    .collect(),
                issns: from_json::<Vec<IssnProxy>>(&row.issns)
                    .or_raise(|| ErrorKind::InvalidData("issns"))?
                    .into_iter()
                    .map(xml::Issn::from)
                    .collect(),
                issue: xml::Issue {
                    volume: row.volume,
                    number: row.number,
                    suppl: row.suppl,
                    fpage: row.fpage,
                    fpage_seq: row.fpage_seq,
                    lpage: row.lpage,
                    elocation_id: row.elocation_id,
                    pub_year: row.pub_year,
                },
                authors: from_json::<Vec<AuthorProxy>>(&row.authors)
                    .or_raise(|| ErrorKind::InvalidData("authors"))?
                    .into_iter()
                    .map(xml::Author::from)
                    .collect(),
                collab: row.collab,
                article_titles: from_json::<Vec<TitleProxy>>(&row.article_titles)
                    .or_raise(|| ErrorKind::InvalidData("article_titles"))?
                    .into_iter()
                    .map(|title| (title.lang, title.title))
                    .collect(),
                partial_body: row.partial_body,
            },
            xml: row.xml,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: UtcDateTime::from_unix_timestamp(row.created_at)
                .or_raise(|| ErrorKind::InvalidData("created_at"))?,
            updated_at: UtcDateTime::from_unix_timestamp(row.updated_at)
                .or_raise(|| ErrorKind::InvalidData("updated_at"))?,
        })
    }
}
